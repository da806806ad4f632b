/// Format/type mapper: `enum`, then a recognized `format`, then `type` decide
/// the semantic type of a schema node. The first keyword that resolves wins.
use serde_json::Value;

use crate::ast::{FieldType, TypeKeyword};
use crate::enums::make_enum;
use crate::error::TranslateError;

/// Result of mapping one node. `Sequence` and `Record` are placeholders the
/// field assembler replaces by recursing into `items` or the node itself.
#[derive(Debug, Clone)]
pub enum MappedType {
    Resolved(FieldType),
    Sequence,
    Record,
}

pub fn map_type(prop_name: &str, node: &Value) -> Result<MappedType, TranslateError> {
    if node.get("enum").is_some() {
        let descriptor = make_enum(prop_name, node)?;
        return Ok(MappedType::Resolved(FieldType::Enum(descriptor)));
    }

    let format = node.get("format").and_then(Value::as_str);
    if let Some(ty) = format.and_then(format_type) {
        return Ok(MappedType::Resolved(ty));
    }

    match node.get("type") {
        Some(ty) => type_of(prop_name, ty),
        // Custom formats annotate strings unless `type` says otherwise.
        None if format.is_some() => Ok(MappedType::Resolved(FieldType::String)),
        None => Ok(MappedType::Resolved(FieldType::Any)),
    }
}

/// Format table. `None` for formats it does not recognize, which leaves the
/// decision to `type`.
pub fn format_type(format: &str) -> Option<FieldType> {
    match format {
        "date-time" => Some(FieldType::DateTime),
        "date" => Some(FieldType::Date),
        "time" => Some(FieldType::Time),
        "uuid" => Some(FieldType::Uuid),
        "uri" | "uri-reference" | "uri-template" | "iri" | "iri-reference" | "email"
        | "idn-email" | "hostname" | "idn-hostname" | "ipv4" | "ipv6" | "json-pointer"
        | "relative-json-pointer" | "regex" | "duration" => Some(FieldType::String),
        _ => None,
    }
}

fn type_of(prop_name: &str, ty: &Value) -> Result<MappedType, TranslateError> {
    let name = match ty {
        Value::String(s) => s.as_str(),
        // ["string", "null"] and friends: the first non-null member decides.
        Value::Array(members) => {
            let names: Vec<&str> = members.iter().filter_map(Value::as_str).collect();
            match names.iter().find(|n| **n != "null").or(names.first()) {
                Some(n) => *n,
                None => return Ok(MappedType::Resolved(FieldType::Any)),
            }
        }
        other => {
            return Err(TranslateError::UnsupportedType {
                property: prop_name.to_string(),
                value: other.to_string(),
            })
        }
    };

    let kw = TypeKeyword::parse(name).ok_or_else(|| TranslateError::UnsupportedType {
        property: prop_name.to_string(),
        value: name.to_string(),
    })?;

    Ok(match kw {
        TypeKeyword::String => MappedType::Resolved(FieldType::String),
        TypeKeyword::Number => MappedType::Resolved(FieldType::Float),
        TypeKeyword::Integer => MappedType::Resolved(FieldType::Integer),
        TypeKeyword::Boolean => MappedType::Resolved(FieldType::Boolean),
        TypeKeyword::Null => MappedType::Resolved(FieldType::Null),
        TypeKeyword::Array => MappedType::Sequence,
        TypeKeyword::Object => MappedType::Record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolved(node: Value) -> FieldType {
        match map_type("p", &node).unwrap() {
            MappedType::Resolved(ty) => ty,
            other => panic!("expected resolved type, got {other:?}"),
        }
    }

    #[test]
    fn test_type_table() {
        assert!(matches!(resolved(json!({"type": "string"})), FieldType::String));
        assert!(matches!(resolved(json!({"type": "number"})), FieldType::Float));
        assert!(matches!(resolved(json!({"type": "integer"})), FieldType::Integer));
        assert!(matches!(resolved(json!({"type": "boolean"})), FieldType::Boolean));
        assert!(matches!(resolved(json!({"type": "null"})), FieldType::Null));
    }

    #[test]
    fn test_placeholders() {
        assert!(matches!(
            map_type("p", &json!({"type": "array"})).unwrap(),
            MappedType::Sequence
        ));
        assert!(matches!(
            map_type("p", &json!({"type": "object"})).unwrap(),
            MappedType::Record
        ));
    }

    #[test]
    fn test_format_beats_type() {
        assert!(matches!(
            resolved(json!({"type": "string", "format": "date"})),
            FieldType::Date
        ));
        assert!(matches!(
            resolved(json!({"type": "string", "format": "date-time"})),
            FieldType::DateTime
        ));
        assert!(matches!(resolved(json!({"format": "time"})), FieldType::Time));
        assert!(matches!(resolved(json!({"format": "uuid"})), FieldType::Uuid));
        assert!(matches!(resolved(json!({"format": "email"})), FieldType::String));
    }

    #[test]
    fn test_unknown_format_defers_to_type() {
        assert!(matches!(
            resolved(json!({"type": "integer", "format": "even"})),
            FieldType::Integer
        ));
        assert!(matches!(
            resolved(json!({"type": "boolean", "format": "flag"})),
            FieldType::Boolean
        ));
        assert!(matches!(resolved(json!({"format": "even"})), FieldType::String));
        assert_eq!(format_type("even").map(|t| t.display_name()), None);
    }

    #[test]
    fn test_enum_beats_format() {
        let ty = resolved(json!({"type": "string", "format": "date", "enum": ["2000-01-01"]}));
        assert_eq!(ty.as_enum().map(|e| e.name()), Some("pEnum"));
    }

    #[test]
    fn test_no_keywords_is_any() {
        assert!(matches!(resolved(json!({"description": "x"})), FieldType::Any));
    }

    #[test]
    fn test_nullable_type_array() {
        assert!(matches!(resolved(json!({"type": ["null", "integer"]})), FieldType::Integer));
        assert!(matches!(resolved(json!({"type": ["null"]})), FieldType::Null));
    }

    #[test]
    fn test_unsupported_type() {
        let err = map_type("age", &json!({"type": "decimal"})).unwrap_err();
        match err {
            TranslateError::UnsupportedType { property, value } => {
                assert_eq!(property, "age");
                assert_eq!(value, "decimal");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
