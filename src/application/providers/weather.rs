use crate::catalog::{CatalogError, ToolCatalog};
use crate::types::{ParamKind, ParameterDescriptor, ToolDescriptor};
use crate::weather::WeatherService;
use futures::FutureExt;
use serde_json::json;
use std::sync::Arc;

pub fn register_weather(
    catalog: &mut ToolCatalog,
    service: Arc<WeatherService>,
) -> Result<(), CatalogError> {
    let current = Arc::clone(&service);
    catalog.register(
        ToolDescriptor::new(
            "weather.get",
            "Get current weather for a location",
            vec![ParameterDescriptor::required("location", ParamKind::String)],
        ),
        Arc::new(move |args| {
            let service = Arc::clone(&current);
            async move {
                let report = service.current(args.str("location")?);
                Ok(serde_json::to_value(report)?)
            }
            .boxed()
        }),
    )?;

    catalog.register(
        ToolDescriptor::new(
            "weather.forecast",
            "Get weather forecast for the next few days",
            vec![
                ParameterDescriptor::required("location", ParamKind::String),
                ParameterDescriptor::optional("days", ParamKind::Int, json!(3)),
            ],
        ),
        Arc::new(move |args| {
            let service = Arc::clone(&service);
            async move {
                let days = args.opt_int("days").unwrap_or(3);
                let forecast = service.forecast(args.str("location")?, days);
                Ok(serde_json::to_value(forecast)?)
            }
            .boxed()
        }),
    )?;

    Ok(())
}
