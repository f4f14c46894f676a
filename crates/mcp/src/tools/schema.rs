// JSON schema helpers for tool input schemas, plus the argument validator

use crate::error::DispatchError;
use serde_json::{Map, Value};

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_string_with_default(description: &str, default: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description,
        "default": default
    })
}

/// Validate `arguments` against an object schema and fill in declared defaults.
///
/// Supports the subset of JSON Schema used by catalog entries: `required`,
/// `properties.*.type`, `properties.*.default` and `additionalProperties: false`.
/// `null` is accepted as an empty argument object.
pub fn validate_arguments(schema: &Value, arguments: Value) -> Result<Value, DispatchError> {
    let mut args = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(DispatchError::invalid(
                "arguments",
                format!("expected an object, got {}", type_name(&other)),
            ))
        }
    };

    let empty = Map::new();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));
    if closed {
        if let Some(unknown) = args.keys().find(|key| !properties.contains_key(*key)) {
            return Err(DispatchError::invalid(unknown.clone(), "is not a recognised argument"));
        }
    }

    for (name, property) in properties {
        match args.get(name) {
            Some(value) => {
                if let Some(expected) = property.get("type").and_then(Value::as_str) {
                    if !matches_type(expected, value) {
                        return Err(DispatchError::invalid(
                            name.clone(),
                            format!("expected {}, got {}", expected, type_name(value)),
                        ));
                    }
                }
            }
            None => {
                if let Some(default) = property.get("default") {
                    args.insert(name.clone(), default.clone());
                }
            }
        }
    }

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();

    if let Some(missing) = required.into_iter().find(|name| !args.contains_key(*name)) {
        return Err(DispatchError::invalid(missing, "is required"));
    }

    Ok(Value::Object(args))
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
