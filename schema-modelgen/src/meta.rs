/// Meta-schema validator: rejects malformed schema documents before any
/// field translation happens.
///
/// Two passes. The draft-07 meta-schema (via the `jsonschema` crate) checks
/// keyword shapes; a structural walk then checks what the meta-schema
/// cannot express, such as `required` naming only declared properties.
use serde_json::{Map, Value};
use tracing::debug;

use crate::ast::TypeKeyword;
use crate::error::TranslateError;
use crate::value::pointer_segment;

pub fn validate(schema: &Value) -> Result<(), TranslateError> {
    if !schema.is_object() {
        return Err(invalid("", "schema must be a JSON object"));
    }

    jsonschema::draft7::meta::validate(schema).map_err(|e| TranslateError::SchemaInvalid {
        path: e.instance_path.to_string(),
        message: e.to_string(),
    })?;

    check_node(schema, "")?;
    debug!("schema passed meta-validation");
    Ok(())
}

fn check_node(node: &Value, path: &str) -> Result<(), TranslateError> {
    // Boolean schemas are valid leaves.
    let Some(obj) = node.as_object() else {
        return match node {
            Value::Bool(_) => Ok(()),
            _ => Err(invalid(path, "schema must be a JSON object")),
        };
    };

    if let Some(ty) = obj.get("type") {
        check_type(ty, &format!("{path}/type"))?;
    }

    let properties = match obj.get("properties") {
        None => None,
        Some(Value::Object(props)) => Some(props),
        Some(_) => return Err(invalid(&format!("{path}/properties"), "must be an object")),
    };

    if let Some(required) = obj.get("required") {
        check_required(required, properties, &format!("{path}/required"))?;
    }

    if let Some(props) = properties {
        for (name, sub) in props {
            check_node(sub, &format!("{path}/properties/{}", pointer_segment(name)))?;
        }
    }

    match obj.get("items") {
        Some(Value::Array(tuple)) => {
            for (i, sub) in tuple.iter().enumerate() {
                check_node(sub, &format!("{path}/items/{i}"))?;
            }
        }
        Some(sub) => check_node(sub, &format!("{path}/items"))?,
        None => {}
    }

    for key in ["definitions", "$defs"] {
        if let Some(Value::Object(defs)) = obj.get(key) {
            for (name, sub) in defs {
                check_node(sub, &format!("{path}/{key}/{}", pointer_segment(name)))?;
            }
        }
    }

    Ok(())
}

fn check_type(ty: &Value, path: &str) -> Result<(), TranslateError> {
    let names: Vec<&Value> = match ty {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    for name in names {
        let known = name.as_str().and_then(TypeKeyword::parse).is_some();
        if !known {
            let expected: Vec<&str> = TypeKeyword::ALL.iter().map(TypeKeyword::as_str).collect();
            return Err(invalid(
                path,
                &format!("unknown type {name}, expected one of {}", expected.join(", ")),
            ));
        }
    }
    Ok(())
}

fn check_required(
    required: &Value,
    properties: Option<&Map<String, Value>>,
    path: &str,
) -> Result<(), TranslateError> {
    let names = required
        .as_array()
        .ok_or_else(|| invalid(path, "must be an array of property names"))?;
    for (i, name) in names.iter().enumerate() {
        let name = name
            .as_str()
            .ok_or_else(|| invalid(&format!("{path}/{i}"), "must be a string"))?;
        if !properties.is_some_and(|p| p.contains_key(name)) {
            return Err(invalid(
                &format!("{path}/{i}"),
                &format!("required property '{name}' is not declared in 'properties'"),
            ));
        }
    }
    Ok(())
}

fn invalid(path: &str, message: &str) -> TranslateError {
    TranslateError::SchemaInvalid {
        path: path.to_string(),
        message: message.to_string(),
    }
}
