/// Constraint extractor: reads the validation keywords of a schema node into
/// a named constraint set, gated by the node's mapped type.
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::ast::FieldType;
use crate::error::TranslateError;
use crate::mapper::MappedType;

/// Named constraints of one field. Only the names meaningful for the
/// field's type are ever populated.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_pattern"
    )]
    pub pattern: Option<Regex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn serialize_pattern<S: Serializer>(pattern: &Option<Regex>, s: S) -> Result<S::Ok, S::Error> {
    match pattern {
        Some(re) => s.serialize_str(re.as_str()),
        None => s.serialize_none(),
    }
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    /// Names of the populated constraints, in a fixed order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.gt.is_some() {
            names.push("gt");
        }
        if self.lt.is_some() {
            names.push("lt");
        }
        if self.ge.is_some() {
            names.push("ge");
        }
        if self.le.is_some() {
            names.push("le");
        }
        if self.pattern.is_some() {
            names.push("pattern");
        }
        if self.min_length.is_some() {
            names.push("min_length");
        }
        if self.max_length.is_some() {
            names.push("max_length");
        }
        if self.unique.is_some() {
            names.push("unique");
        }
        if self.description.is_some() {
            names.push("description");
        }
        names
    }

    pub fn is_unique(&self) -> bool {
        self.unique.unwrap_or(false)
    }
}

/// Extract the constraints of `node` that apply to `mapped`.
pub fn extract_constraints(
    prop_name: &str,
    node: &Value,
    mapped: &MappedType,
) -> Result<Constraints, TranslateError> {
    let mut c = Constraints {
        description: node
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        ..Constraints::default()
    };

    match mapped {
        MappedType::Resolved(ty) if ty.is_numeric() => {
            c.gt = number(prop_name, node, "exclusiveMinimum")?;
            c.lt = number(prop_name, node, "exclusiveMaximum")?;
            c.ge = number(prop_name, node, "minimum")?;
            c.le = number(prop_name, node, "maximum")?;
        }
        MappedType::Resolved(FieldType::String) => {
            if let Some(p) = node.get("pattern") {
                let src = p.as_str().ok_or_else(|| invalid(prop_name, "pattern", "a string"))?;
                let re = Regex::new(src).map_err(|source| TranslateError::InvalidPattern {
                    property: prop_name.to_string(),
                    source,
                })?;
                c.pattern = Some(re);
            }
            c.min_length = length(prop_name, node, "minLength")?;
            c.max_length = length(prop_name, node, "maxLength")?;
        }
        MappedType::Sequence => {
            c.min_length = length(prop_name, node, "minItems")?;
            c.max_length = length(prop_name, node, "maxItems")?;
            if let Some(u) = node.get("uniqueItems") {
                c.unique = Some(
                    u.as_bool()
                        .ok_or_else(|| invalid(prop_name, "uniqueItems", "a boolean"))?,
                );
            }
        }
        _ => {}
    }

    Ok(c)
}

fn number(prop_name: &str, node: &Value, key: &str) -> Result<Option<f64>, TranslateError> {
    node.get(key)
        .map(|v| v.as_f64().ok_or_else(|| invalid(prop_name, key, "a number")))
        .transpose()
}

fn length(prop_name: &str, node: &Value, key: &str) -> Result<Option<usize>, TranslateError> {
    node.get(key)
        .map(|v| {
            v.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| invalid(prop_name, key, "a non-negative integer"))
        })
        .transpose()
}

fn invalid(prop_name: &str, key: &str, expected: &str) -> TranslateError {
    TranslateError::SchemaInvalid {
        path: format!("{prop_name}/{key}"),
        message: format!("'{key}' must be {expected}"),
    }
}
