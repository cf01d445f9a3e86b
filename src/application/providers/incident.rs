use super::todo::record_id;
use crate::catalog::{CatalogError, ToolCatalog};
use crate::incident::{IncidentStore, IncidentUpdate};
use crate::types::{ParamKind, ParameterDescriptor, ToolDescriptor};
use futures::FutureExt;
use serde_json::Value;
use std::sync::Arc;

pub fn register_incident(
    catalog: &mut ToolCatalog,
    store: Arc<IncidentStore>,
) -> Result<(), CatalogError> {
    let create_store = Arc::clone(&store);
    catalog.register(
        ToolDescriptor::new(
            "incident.create",
            "Create a new ITSM incident",
            vec![
                ParameterDescriptor::required("title", ParamKind::String),
                ParameterDescriptor::required("description", ParamKind::String),
                ParameterDescriptor::optional("priority", ParamKind::String, Value::Null),
                ParameterDescriptor::optional("assignedTo", ParamKind::String, Value::Null),
            ],
        ),
        Arc::new(move |args| {
            let store = Arc::clone(&create_store);
            async move {
                let incident = store.create(
                    args.str("title")?,
                    args.str("description")?,
                    args.opt_str("priority"),
                    args.opt_str("assignedTo"),
                );
                Ok(serde_json::to_value(incident)?)
            }
            .boxed()
        }),
    )?;

    let get_store = Arc::clone(&store);
    catalog.register(
        ToolDescriptor::new(
            "incident.get",
            "Retrieve incident details",
            vec![ParameterDescriptor::required("id", ParamKind::Int)],
        ),
        Arc::new(move |args| {
            let store = Arc::clone(&get_store);
            async move {
                match store.get(record_id(args.int("id")?)) {
                    Some(incident) => Ok(serde_json::to_value(incident)?),
                    None => Ok(Value::Null),
                }
            }
            .boxed()
        }),
    )?;

    let list_store = Arc::clone(&store);
    catalog.register(
        ToolDescriptor::new("incident.list", "Get all incidents", Vec::new()),
        Arc::new(move |_args| {
            let store = Arc::clone(&list_store);
            async move { Ok(serde_json::to_value(store.all())?) }.boxed()
        }),
    )?;

    catalog.register(
        ToolDescriptor::new(
            "incident.update",
            "Update an existing incident",
            vec![
                ParameterDescriptor::required("id", ParamKind::Int),
                ParameterDescriptor::optional("title", ParamKind::String, Value::Null),
                ParameterDescriptor::optional("description", ParamKind::String, Value::Null),
                ParameterDescriptor::optional("priority", ParamKind::String, Value::Null),
                ParameterDescriptor::optional("status", ParamKind::String, Value::Null),
                ParameterDescriptor::optional("assignedTo", ParamKind::String, Value::Null),
            ],
        ),
        Arc::new(move |args| {
            let store = Arc::clone(&store);
            async move {
                let id = record_id(args.int("id")?);
                let update = IncidentUpdate {
                    title: args.opt_str("title"),
                    description: args.opt_str("description"),
                    priority: args.opt_str("priority"),
                    status: args.opt_str("status"),
                    assigned_to: args.opt_str("assignedTo"),
                };
                match store.update(id, update) {
                    Some(incident) => Ok(serde_json::to_value(incident)?),
                    None => Ok(Value::Null),
                }
            }
            .boxed()
        }),
    )?;

    Ok(())
}
