use crate::catalog::{CatalogError, HandlerError, ToolCatalog};
use crate::coerce::{CoerceError, coerce};
use crate::types::ContentItem;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Coerce(#[from] CoerceError),
    #[error("tool '{tool}' failed: {source}")]
    Handler {
        tool: String,
        #[source]
        source: HandlerError,
    },
}

impl DispatchError {
    /// Message safe to hand to a shell user or HTTP caller. The error
    /// taxonomy here is already human-readable; this exists so callers
    /// never ship a `Debug` rendering across the boundary.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Resolves a tool by name, coerces the wire arguments against its schema,
/// awaits the handler, and normalizes whatever comes back into content
/// items. Holds no per-call state; one instance serves any number of
/// concurrent callers.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<ToolCatalog>,
}

impl Dispatcher {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub async fn invoke(
        &self,
        tool: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<ContentItem>, DispatchError> {
        debug!(tool, "Dispatching tool invocation");
        let entry = self.catalog.lookup(tool)?;
        let args = coerce(&entry.descriptor.parameters, arguments)?;
        let value = (entry.handler)(args)
            .await
            .map_err(|source| DispatchError::Handler {
                tool: tool.to_string(),
                source,
            })?;
        let items = normalize(value);
        info!(tool, items = items.len(), "Tool invocation completed");
        Ok(items)
    }
}

/// Normalization rules: nothing for `null`, a text item for scalars, a
/// single data item for structured payloads (the structured form stays
/// authoritative; no text mirror is emitted).
fn normalize(value: Value) -> Vec<ContentItem> {
    match value {
        Value::Null => Vec::new(),
        Value::Bool(flag) => vec![ContentItem::text(flag.to_string())],
        Value::Number(number) => vec![ContentItem::text(number.to_string())],
        Value::String(text) => vec![ContentItem::text(text)],
        structured @ (Value::Object(_) | Value::Array(_)) => {
            vec![ContentItem::data(structured)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        let catalog = providers::build_catalog().expect("catalog builds");
        Dispatcher::new(Arc::new(catalog))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().expect("test input is an object").clone()
    }

    fn data_payload(items: &[ContentItem]) -> &Value {
        match items {
            [ContentItem::Data { data }] => data,
            other => panic!("expected one data item, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_todo_assigns_monotonic_ids() {
        let dispatcher = dispatcher();

        let first = dispatcher
            .invoke("todo.create", &args(json!({ "title": "Buy milk" })))
            .await
            .expect("first create succeeds");
        let payload = data_payload(&first);
        assert_eq!(payload["id"], json!(1));
        assert_eq!(payload["title"], json!("Buy milk"));
        assert_eq!(payload["isCompleted"], json!(false));

        let second = dispatcher
            .invoke("todo.create", &args(json!({ "title": "Buy eggs" })))
            .await
            .expect("second create succeeds");
        assert_eq!(data_payload(&second)["id"], json!(2));
    }

    #[tokio::test]
    async fn get_by_unknown_id_is_empty_not_a_parameter_error() {
        let dispatcher = dispatcher();
        let items = dispatcher
            .invoke("todo.get", &args(json!({ "id": 1 })))
            .await
            .expect("lookup succeeds even when nothing matches");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn boolean_result_becomes_a_text_item() {
        let dispatcher = dispatcher();
        let items = dispatcher
            .invoke("todo.delete", &args(json!({ "id": 1 })))
            .await
            .expect("delete succeeds");
        assert_eq!(items, vec![ContentItem::text("false")]);
    }

    #[tokio::test]
    async fn unknown_tool_propagates_not_found() {
        let dispatcher = dispatcher();
        let error = dispatcher
            .invoke("todo.explode", &Map::new())
            .await
            .expect_err("unknown tool fails");
        assert!(matches!(
            error,
            DispatchError::Catalog(CatalogError::NotFound { tool }) if tool == "todo.explode"
        ));
    }

    #[tokio::test]
    async fn missing_required_parameter_propagates() {
        let dispatcher = dispatcher();
        let error = dispatcher
            .invoke("todo.create", &Map::new())
            .await
            .expect_err("title is required");
        assert!(matches!(
            error,
            DispatchError::Coerce(CoerceError::MissingParameter { name }) if name == "title"
        ));
    }

    #[tokio::test]
    async fn scalar_string_result_becomes_text() {
        let dispatcher = dispatcher();
        let items = dispatcher
            .invoke("echo.say", &args(json!({ "message": "hello" })))
            .await
            .expect("echo succeeds");
        assert_eq!(items, vec![ContentItem::text("hello")]);
    }

    #[tokio::test]
    async fn structured_list_result_becomes_one_data_item() {
        let dispatcher = dispatcher();
        dispatcher
            .invoke("todo.create", &args(json!({ "title": "Buy milk" })))
            .await
            .expect("create succeeds");

        let items = dispatcher
            .invoke("todo.list", &Map::new())
            .await
            .expect("list succeeds");
        let payload = data_payload(&items);
        assert!(payload.is_array());
        assert_eq!(payload.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn normalize_handles_every_shape() {
        assert!(normalize(Value::Null).is_empty());
        assert_eq!(normalize(json!(7)), vec![ContentItem::text("7")]);
        assert_eq!(normalize(json!(true)), vec![ContentItem::text("true")]);
        assert_eq!(normalize(json!("hi")), vec![ContentItem::text("hi")]);
        assert_eq!(
            normalize(json!({ "a": 1 })),
            vec![ContentItem::data(json!({ "a": 1 }))]
        );
    }
}
