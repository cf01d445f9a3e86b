mod echo;
mod incident;
mod todo;
mod weather;

use crate::catalog::{CatalogError, ToolCatalog};
use crate::incident::IncidentStore;
use crate::todo::TodoStore;
use crate::weather::WeatherService;
use std::sync::Arc;

pub use echo::register_echo;
pub use incident::register_incident;
pub use todo::register_todo;
pub use weather::register_weather;

/// Wire the full gateway catalog over fresh in-memory stores. Each
/// provider contributes its `(descriptor, handler)` pairs; the catalog is
/// immutable afterwards.
pub fn build_catalog() -> Result<ToolCatalog, CatalogError> {
    build_catalog_with(
        Arc::new(TodoStore::new()),
        Arc::new(IncidentStore::new()),
        Arc::new(WeatherService::new()),
    )
}

pub fn build_catalog_with(
    todos: Arc<TodoStore>,
    incidents: Arc<IncidentStore>,
    weather: Arc<WeatherService>,
) -> Result<ToolCatalog, CatalogError> {
    let mut catalog = ToolCatalog::new();
    register_echo(&mut catalog)?;
    register_todo(&mut catalog, todos)?;
    register_incident(&mut catalog, incidents)?;
    register_weather(&mut catalog, weather)?;
    Ok(catalog)
}
