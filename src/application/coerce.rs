use crate::catalog::HandlerError;
use crate::types::{ParamKind, ParameterDescriptor};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("missing required parameter '{name}'")]
    MissingParameter { name: String },
    #[error("parameter '{name}' expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: String,
    },
}

/// A coerced argument, tagged with its semantic type. `Null` marks an
/// optional parameter that was neither supplied nor defaulted to a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Object(Value),
    Null,
}

/// Ordered, typed argument list produced by [`coerce`]. Handlers read
/// values by name; the typed accessors fail with a [`HandlerError`] only
/// on a schema/handler mismatch, which coercion rules out for well-formed
/// registrations.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    values: Vec<(String, ArgValue)>,
}

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn str(&self, name: &str) -> Result<&str, HandlerError> {
        match self.get(name) {
            Some(ArgValue::Str(value)) => Ok(value),
            other => Err(mismatch(name, "string", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, HandlerError> {
        match self.get(name) {
            Some(ArgValue::Int(value)) => Ok(*value),
            other => Err(mismatch(name, "int", other)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool, HandlerError> {
        match self.get(name) {
            Some(ArgValue::Bool(value)) => Ok(*value),
            other => Err(mismatch(name, "bool", other)),
        }
    }

    pub fn opt_str(&self, name: &str) -> Option<String> {
        match self.get(name) {
            Some(ArgValue::Str(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn opt_int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ArgValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn opt_flag(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ArgValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }
}

fn mismatch(name: &str, expected: &str, found: Option<&ArgValue>) -> HandlerError {
    HandlerError::new(format!(
        "handler read argument '{name}' as {expected}, but it holds {found:?}"
    ))
}

/// Convert an untyped wire map into the ordered argument list a handler
/// expects. Walks the declared parameters in order: supplied values are
/// converted to the declared type, absent optionals take their default,
/// absent required parameters fail. Keys not declared by the tool are
/// ignored. An explicit JSON `null` counts as absent.
pub fn coerce(
    parameters: &[ParameterDescriptor],
    raw: &Map<String, Value>,
) -> Result<ToolArgs, CoerceError> {
    let mut values = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        let supplied = raw.get(&parameter.name).filter(|value| !value.is_null());
        let value = match supplied {
            Some(value) => convert(parameter, value)?,
            None => match &parameter.default {
                Some(default) if !default.is_null() => convert(parameter, default)?,
                Some(_) => ArgValue::Null,
                None => {
                    return Err(CoerceError::MissingParameter {
                        name: parameter.name.clone(),
                    });
                }
            },
        };
        values.push((parameter.name.clone(), value));
    }
    Ok(ToolArgs { values })
}

fn convert(parameter: &ParameterDescriptor, value: &Value) -> Result<ArgValue, CoerceError> {
    match parameter.kind {
        ParamKind::String => match value {
            Value::String(text) => Ok(ArgValue::Str(text.clone())),
            other => Err(type_mismatch(parameter, other)),
        },
        ParamKind::Int => match value {
            Value::Number(number) => number
                .as_i64()
                .map(ArgValue::Int)
                .ok_or_else(|| type_mismatch(parameter, value)),
            // Shell and model output deliver numbers as strings.
            Value::String(text) => text
                .trim()
                .parse::<i64>()
                .map(ArgValue::Int)
                .map_err(|_| type_mismatch(parameter, value)),
            other => Err(type_mismatch(parameter, other)),
        },
        ParamKind::Bool => match value {
            Value::Bool(flag) => Ok(ArgValue::Bool(*flag)),
            Value::String(text) if text.eq_ignore_ascii_case("true") => Ok(ArgValue::Bool(true)),
            Value::String(text) if text.eq_ignore_ascii_case("false") => Ok(ArgValue::Bool(false)),
            other => Err(type_mismatch(parameter, other)),
        },
        ParamKind::Object => match value {
            Value::Object(_) | Value::Array(_) => Ok(ArgValue::Object(value.clone())),
            other => Err(type_mismatch(parameter, other)),
        },
    }
}

fn type_mismatch(parameter: &ParameterDescriptor, value: &Value) -> CoerceError {
    CoerceError::TypeMismatch {
        name: parameter.name.clone(),
        expected: parameter.kind.as_str(),
        found: describe(value),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(text) => format!("string '{text}'"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Vec<ParameterDescriptor> {
        vec![
            ParameterDescriptor::required("id", ParamKind::Int),
            ParameterDescriptor::required("title", ParamKind::String),
            ParameterDescriptor::optional("days", ParamKind::Int, json!(3)),
            ParameterDescriptor::optional("isCompleted", ParamKind::Bool, Value::Null),
        ]
    }

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().expect("test input is an object").clone()
    }

    #[test]
    fn missing_required_names_the_parameter() {
        let error = coerce(&params(), &raw(json!({ "title": "Buy milk" })))
            .expect_err("id is required");
        assert!(matches!(error, CoerceError::MissingParameter { name } if name == "id"));

        // Order of the other supplied fields does not change the verdict.
        let error = coerce(
            &params(),
            &raw(json!({ "isCompleted": true, "days": 5, "title": "Buy milk" })),
        )
        .expect_err("id is still required");
        assert!(matches!(error, CoerceError::MissingParameter { name } if name == "id"));
    }

    #[test]
    fn defaults_apply_and_are_stable_across_calls() {
        let input = raw(json!({ "id": 1, "title": "Buy milk" }));
        for _ in 0..3 {
            let args = coerce(&params(), &input).expect("coercion succeeds");
            assert_eq!(args.opt_int("days"), Some(3));
            assert_eq!(args.opt_flag("isCompleted"), None);
        }
    }

    #[test]
    fn numeric_string_coerces_to_int() {
        let args = coerce(&params(), &raw(json!({ "id": "17", "title": "Buy milk" })))
            .expect("coercion succeeds");
        assert_eq!(args.int("id").expect("id present"), 17);
    }

    #[test]
    fn boolean_strings_coerce_to_bool() {
        let args = coerce(
            &params(),
            &raw(json!({ "id": 1, "title": "x", "isCompleted": "true" })),
        )
        .expect("coercion succeeds");
        assert_eq!(args.opt_flag("isCompleted"), Some(true));
    }

    #[test]
    fn incompatible_shape_names_the_parameter() {
        let error = coerce(&params(), &raw(json!({ "id": [1], "title": "Buy milk" })))
            .expect_err("array is not an int");
        match error {
            CoerceError::TypeMismatch { name, expected, .. } => {
                assert_eq!(name, "id");
                assert_eq!(expected, "int");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn string_parameter_rejects_numbers() {
        let error = coerce(&params(), &raw(json!({ "id": 1, "title": 42 })))
            .expect_err("number is not a string");
        assert!(matches!(error, CoerceError::TypeMismatch { name, .. } if name == "title"));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let args = coerce(
            &params(),
            &raw(json!({ "id": 1, "title": "Buy milk", "color": "red" })),
        )
        .expect("coercion succeeds");
        assert!(args.get("color").is_none());
    }

    #[test]
    fn explicit_null_counts_as_absent() {
        let args = coerce(
            &params(),
            &raw(json!({ "id": 1, "title": "Buy milk", "days": null })),
        )
        .expect("coercion succeeds");
        assert_eq!(args.opt_int("days"), Some(3));

        let error = coerce(&params(), &raw(json!({ "id": null, "title": "Buy milk" })))
            .expect_err("null does not satisfy a required parameter");
        assert!(matches!(error, CoerceError::MissingParameter { name } if name == "id"));
    }

    #[test]
    fn arguments_come_back_in_declared_order() {
        let args = coerce(
            &params(),
            &raw(json!({ "title": "Buy milk", "id": 1, "days": 4 })),
        )
        .expect("coercion succeeds");
        let names: Vec<_> = args.values.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "days", "isCompleted"]);
    }
}
