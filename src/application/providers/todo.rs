use crate::catalog::{CatalogError, ToolCatalog, ToolHandler};
use crate::todo::TodoStore;
use crate::types::{ParamKind, ParameterDescriptor, ToolDescriptor};
use futures::FutureExt;
use serde_json::Value;
use std::sync::Arc;

pub fn register_todo(
    catalog: &mut ToolCatalog,
    store: Arc<TodoStore>,
) -> Result<(), CatalogError> {
    let list_store = Arc::clone(&store);
    catalog.register(
        ToolDescriptor::new("todo.list", "Get all todo items", Vec::new()),
        Arc::new(move |_args| {
            let store = Arc::clone(&list_store);
            async move { Ok(serde_json::to_value(store.all())?) }.boxed()
        }) as ToolHandler,
    )?;

    let get_store = Arc::clone(&store);
    catalog.register(
        ToolDescriptor::new(
            "todo.get",
            "Get a todo item by ID",
            vec![ParameterDescriptor::required("id", ParamKind::Int)],
        ),
        Arc::new(move |args| {
            let store = Arc::clone(&get_store);
            async move {
                match store.get(record_id(args.int("id")?)) {
                    Some(item) => Ok(serde_json::to_value(item)?),
                    None => Ok(Value::Null),
                }
            }
            .boxed()
        }),
    )?;

    let create_store = Arc::clone(&store);
    catalog.register(
        ToolDescriptor::new(
            "todo.create",
            "Create a new todo item",
            vec![ParameterDescriptor::required("title", ParamKind::String)],
        ),
        Arc::new(move |args| {
            let store = Arc::clone(&create_store);
            async move {
                let item = store.create(args.str("title")?);
                Ok(serde_json::to_value(item)?)
            }
            .boxed()
        }),
    )?;

    let update_store = Arc::clone(&store);
    catalog.register(
        ToolDescriptor::new(
            "todo.update",
            "Update an existing todo item",
            vec![
                ParameterDescriptor::required("id", ParamKind::Int),
                ParameterDescriptor::optional("title", ParamKind::String, Value::Null),
                ParameterDescriptor::optional("isCompleted", ParamKind::Bool, Value::Null),
            ],
        ),
        Arc::new(move |args| {
            let store = Arc::clone(&update_store);
            async move {
                let id = record_id(args.int("id")?);
                match store.update(id, args.opt_str("title"), args.opt_flag("isCompleted")) {
                    Some(item) => Ok(serde_json::to_value(item)?),
                    None => Ok(Value::Null),
                }
            }
            .boxed()
        }),
    )?;

    catalog.register(
        ToolDescriptor::new(
            "todo.delete",
            "Delete a todo item",
            vec![ParameterDescriptor::required("id", ParamKind::Int)],
        ),
        Arc::new(move |args| {
            let store = Arc::clone(&store);
            async move { Ok(Value::Bool(store.delete(record_id(args.int("id")?)))) }.boxed()
        }),
    )?;

    Ok(())
}

/// Negative ids can arrive over the wire; they simply never match a record.
pub(super) fn record_id(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}
