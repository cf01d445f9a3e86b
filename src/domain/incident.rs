use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub const DEFAULT_PRIORITY: &str = "Medium";
pub const INITIAL_STATUS: &str = "New";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Low, Medium, High, Critical
    pub priority: String,
    /// New, InProgress, Resolved, Closed
    pub status: String,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct IncidentState {
    incidents: Vec<Incident>,
    next_id: u64,
}

#[derive(Debug)]
pub struct IncidentStore {
    state: Mutex<IncidentState>,
}

#[derive(Debug, Default, Clone)]
pub struct IncidentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
}

impl IncidentStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(IncidentState {
                incidents: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub fn all(&self) -> Vec<Incident> {
        self.state
            .lock()
            .expect("incident store lock")
            .incidents
            .clone()
    }

    pub fn get(&self, id: u64) -> Option<Incident> {
        self.state
            .lock()
            .expect("incident store lock")
            .incidents
            .iter()
            .find(|incident| incident.id == id)
            .cloned()
    }

    pub fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Option<String>,
        assigned_to: Option<String>,
    ) -> Incident {
        let mut state = self.state.lock().expect("incident store lock");
        let incident = Incident {
            id: state.next_id,
            title: title.into(),
            description: description.into(),
            priority: priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            status: INITIAL_STATUS.to_string(),
            assigned_to,
            created_at: Utc::now(),
            resolved_at: None,
        };
        state.next_id += 1;
        state.incidents.push(incident.clone());
        incident
    }

    pub fn update(&self, id: u64, update: IncidentUpdate) -> Option<Incident> {
        let mut state = self.state.lock().expect("incident store lock");
        let incident = state.incidents.iter_mut().find(|incident| incident.id == id)?;
        if let Some(title) = update.title {
            incident.title = title;
        }
        if let Some(description) = update.description {
            incident.description = description;
        }
        if let Some(priority) = update.priority {
            incident.priority = priority;
        }
        if let Some(status) = update.status {
            // First transition into Resolved/Closed stamps the resolution time.
            if (status == "Resolved" || status == "Closed") && incident.resolved_at.is_none() {
                incident.resolved_at = Some(Utc::now());
            }
            incident.status = status;
        }
        if let Some(assigned_to) = update.assigned_to {
            incident.assigned_to = Some(assigned_to);
        }
        Some(incident.clone())
    }

    pub fn delete(&self, id: u64) -> bool {
        let mut state = self.state.lock().expect("incident store lock");
        let before = state.incidents.len();
        state.incidents.retain(|incident| incident.id != id);
        state.incidents.len() != before
    }
}

impl Default for IncidentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_applies_defaults() {
        let store = IncidentStore::new();
        let incident = store.create("Printer down", "Floor 3 printer jams", None, None);
        assert_eq!(incident.id, 1);
        assert_eq!(incident.priority, "Medium");
        assert_eq!(incident.status, "New");
        assert!(incident.assigned_to.is_none());
        assert!(incident.resolved_at.is_none());
    }

    #[test]
    fn explicit_priority_wins_over_default() {
        let store = IncidentStore::new();
        let incident = store.create(
            "Outage",
            "API is down",
            Some("Critical".into()),
            Some("alice".into()),
        );
        assert_eq!(incident.priority, "Critical");
        assert_eq!(incident.assigned_to.as_deref(), Some("alice"));
    }

    #[test]
    fn resolving_stamps_timestamp_once() {
        let store = IncidentStore::new();
        let incident = store.create("Outage", "API is down", None, None);

        let resolved = store
            .update(
                incident.id,
                IncidentUpdate {
                    status: Some("Resolved".into()),
                    ..IncidentUpdate::default()
                },
            )
            .expect("incident exists");
        let stamp = resolved.resolved_at.expect("resolution stamped");

        let closed = store
            .update(
                incident.id,
                IncidentUpdate {
                    status: Some("Closed".into()),
                    ..IncidentUpdate::default()
                },
            )
            .expect("incident exists");
        assert_eq!(closed.resolved_at, Some(stamp));
    }

    #[test]
    fn update_missing_incident_is_none() {
        let store = IncidentStore::new();
        assert!(store.update(9, IncidentUpdate::default()).is_none());
    }
}
