use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{DefaultHasher, Hash, Hasher};

const DESCRIPTIONS: [&str; 7] = [
    "Sunny",
    "Partly cloudy",
    "Cloudy",
    "Rainy",
    "Thunderstorm",
    "Clear",
    "Foggy",
];

pub const MIN_FORECAST_DAYS: i64 = 1;
pub const MAX_FORECAST_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    pub temperature: f64,
    pub description: String,
    pub feels_like: f64,
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
}

/// Synthetic weather source. No upstream API is consulted; values are
/// derived from a hash of the location and day offset so repeated calls
/// for the same inputs agree.
#[derive(Debug, Default)]
pub struct WeatherService;

impl WeatherService {
    pub fn new() -> Self {
        Self
    }

    pub fn current(&self, location: &str) -> WeatherReport {
        self.report(location, 0)
    }

    pub fn forecast(&self, location: &str, days: i64) -> Vec<WeatherReport> {
        let days = days.clamp(MIN_FORECAST_DAYS, MAX_FORECAST_DAYS);
        (0..days).map(|day| self.report(location, day)).collect()
    }

    fn report(&self, location: &str, day: i64) -> WeatherReport {
        let seed = seed(location, day);
        let temperature = 10.0 + (seed % 250) as f64 / 10.0;
        let humidity = ((seed >> 8) % 1000) as f64 / 10.0;
        let description = DESCRIPTIONS[(seed >> 16) as usize % DESCRIPTIONS.len()];
        WeatherReport {
            location: location.to_string(),
            temperature,
            description: description.to_string(),
            feels_like: temperature - 2.0,
            humidity,
            timestamp: Utc::now() + Duration::days(day),
        }
    }
}

fn seed(location: &str, day: i64) -> u64 {
    let mut hasher = DefaultHasher::new();
    location.to_ascii_lowercase().hash(&mut hasher);
    day.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_location_yields_same_conditions() {
        let service = WeatherService::new();
        let first = service.current("Paris");
        let second = service.current("Paris");
        assert_eq!(first.temperature, second.temperature);
        assert_eq!(first.description, second.description);
        assert_eq!(first.humidity, second.humidity);
    }

    #[test]
    fn location_lookup_is_case_insensitive() {
        let service = WeatherService::new();
        let lower = service.current("paris");
        let upper = service.current("PARIS");
        assert_eq!(lower.temperature, upper.temperature);
    }

    #[test]
    fn temperature_stays_in_band() {
        let service = WeatherService::new();
        for location in ["Paris", "Jakarta", "Oslo", "Lima", "Cairo"] {
            let report = service.current(location);
            assert!(report.temperature >= 10.0 && report.temperature < 35.0);
            assert_eq!(report.feels_like, report.temperature - 2.0);
            assert!(report.humidity >= 0.0 && report.humidity < 100.0);
        }
    }

    #[test]
    fn forecast_days_are_clamped() {
        let service = WeatherService::new();
        assert_eq!(service.forecast("Paris", 0).len(), 1);
        assert_eq!(service.forecast("Paris", 3).len(), 3);
        assert_eq!(service.forecast("Paris", 99).len(), 7);
    }
}
