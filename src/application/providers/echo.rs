use crate::catalog::{CatalogError, ToolCatalog};
use crate::types::{ParamKind, ParameterDescriptor, ToolDescriptor};
use futures::FutureExt;
use serde_json::Value;

pub fn register_echo(catalog: &mut ToolCatalog) -> Result<(), CatalogError> {
    catalog.register(
        ToolDescriptor::new(
            "echo.say",
            "Echoes the message back to the caller",
            vec![ParameterDescriptor::required("message", ParamKind::String)],
        ),
        std::sync::Arc::new(|args| {
            async move { Ok(Value::String(args.str("message")?.to_string())) }.boxed()
        }),
    )?;

    catalog.register(
        ToolDescriptor::new(
            "echo.reverse",
            "Echoes the message back reversed",
            vec![ParameterDescriptor::required("message", ParamKind::String)],
        ),
        std::sync::Arc::new(|args| {
            async move {
                let reversed: String = args.str("message")?.chars().rev().collect();
                Ok(Value::String(reversed))
            }
            .boxed()
        }),
    )?;

    Ok(())
}
