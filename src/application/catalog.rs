use crate::coerce::ToolArgs;
use crate::types::ToolDescriptor;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("tool '{tool}' is already registered")]
    Duplicate { tool: String },
    #[error("tool '{tool}' not found")]
    NotFound { tool: String },
}

/// Failure raised by a tool handler itself (as opposed to lookup or
/// coercion failures, which never reach the handler).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(source: serde_json::Error) -> Self {
        Self::new(format!("failed to encode tool result: {source}"))
    }
}

/// Every handler, synchronous or not, is boxed into one future shape the
/// dispatcher awaits. Sync handlers just resolve immediately.
pub type HandlerFuture = BoxFuture<'static, Result<Value, HandlerError>>;

pub type ToolHandler = Arc<dyn Fn(ToolArgs) -> HandlerFuture + Send + Sync>;

#[derive(Clone)]
pub struct ToolEntry {
    pub descriptor: Arc<ToolDescriptor>,
    pub handler: ToolHandler,
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("descriptor", &self.descriptor)
            .field("handler", &"<handler>")
            .finish()
    }
}

/// Registry of callable tools. Populated once at startup from explicit
/// registration tables; read-only afterwards, so concurrent dispatches can
/// share it without locking.
#[derive(Default)]
pub struct ToolCatalog {
    entries: HashMap<String, ToolEntry>,
    order: Vec<String>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: ToolHandler,
    ) -> Result<(), CatalogError> {
        let name = descriptor.name.clone();
        if self.entries.contains_key(&name) {
            return Err(CatalogError::Duplicate { tool: name });
        }
        debug!(tool = name.as_str(), "Registering tool");
        self.entries.insert(
            name.clone(),
            ToolEntry {
                descriptor: Arc::new(descriptor),
                handler,
            },
        );
        self.order.push(name);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolEntry, CatalogError> {
        self.entries.get(name).ok_or_else(|| CatalogError::NotFound {
            tool: name.to_string(),
        })
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<Arc<ToolDescriptor>> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| Arc::clone(&entry.descriptor))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop_handler() -> ToolHandler {
        Arc::new(|_args| async { Ok(Value::Null) }.boxed())
    }

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, format!("{name} description"), Vec::new())
    }

    #[test]
    fn lookup_returns_registered_descriptor() {
        let mut catalog = ToolCatalog::new();
        catalog
            .register(descriptor("todo.list"), noop_handler())
            .expect("register succeeds");

        let entry = catalog.lookup("todo.list").expect("tool found");
        assert_eq!(entry.descriptor.name, "todo.list");
        assert_eq!(entry.descriptor.description, "todo.list description");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut catalog = ToolCatalog::new();
        catalog
            .register(descriptor("todo.list"), noop_handler())
            .expect("first registration succeeds");

        let error = catalog
            .register(descriptor("todo.list"), noop_handler())
            .expect_err("second registration fails");
        assert!(matches!(error, CatalogError::Duplicate { tool } if tool == "todo.list"));
    }

    #[test]
    fn unknown_tool_is_not_found() {
        let catalog = ToolCatalog::new();
        let error = catalog.lookup("nope").expect_err("lookup fails");
        assert!(matches!(error, CatalogError::NotFound { tool } if tool == "nope"));
    }

    #[test]
    fn list_preserves_registration_order_and_is_idempotent() {
        let mut catalog = ToolCatalog::new();
        for name in ["b.second", "a.first", "c.third"] {
            catalog
                .register(descriptor(name), noop_handler())
                .expect("register succeeds");
        }

        let names = |listing: Vec<Arc<ToolDescriptor>>| {
            listing
                .iter()
                .map(|d| d.name.clone())
                .collect::<Vec<_>>()
        };

        let first = names(catalog.list());
        let second = names(catalog.list());
        assert_eq!(first, vec!["b.second", "a.first", "c.third"]);
        assert_eq!(first, second);
    }
}
