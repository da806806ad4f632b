/// Enum synthesizer: turns a node's `enum` array into an ordered set of
/// constants, coercing each literal according to the node's `format`.
use serde::Serialize;
use serde_json::Value;

use crate::error::TranslateError;
use crate::value::{parse_date, parse_datetime, parse_time, FieldValue};

/// One enum constant: the literal as written and its canonical value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    pub raw: Value,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDescriptor {
    name: String,
    format: Option<String>,
    members: Vec<EnumMember>,
}

impl EnumDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Canonical value of the member matching `input`, if any. `input`
    /// matches when it equals a literal or coerces to a member's value.
    pub fn lookup(&self, input: &Value) -> Option<&FieldValue> {
        if let Some(m) = self.members.iter().find(|m| &m.raw == input) {
            return Some(&m.value);
        }
        let coerced = coerce_literal(input, self.format.as_deref()).ok()?;
        self.members
            .iter()
            .find(|m| m.value == coerced)
            .map(|m| &m.value)
    }
}

pub fn make_enum(prop_name: &str, node: &Value) -> Result<EnumDescriptor, TranslateError> {
    let literals = node
        .get("enum")
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::EnumConversion {
            property: prop_name.to_string(),
            message: "'enum' must be an array".into(),
        })?;
    let format = node.get("format").and_then(Value::as_str);

    let members = literals
        .iter()
        .map(|raw| {
            coerce_literal(raw, format)
                .map(|value| EnumMember {
                    raw: raw.clone(),
                    value,
                })
                .map_err(|message| TranslateError::EnumConversion {
                    property: prop_name.to_string(),
                    message,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EnumDescriptor {
        name: format!("{prop_name}Enum"),
        format: format.map(str::to_string),
        members,
    })
}

fn coerce_literal(raw: &Value, format: Option<&str>) -> Result<FieldValue, String> {
    let temporal = matches!(format, Some("date-time" | "date" | "time"));
    if !temporal {
        return Ok(FieldValue::from_json(raw));
    }
    let s = raw
        .as_str()
        .ok_or_else(|| format!("{raw} is not a string"))?;
    let parsed = match format {
        Some("date-time") => parse_datetime(s).map(FieldValue::DateTime),
        Some("date") => parse_date(s).map(FieldValue::Date),
        _ => parse_time(s).map(FieldValue::Time),
    };
    parsed.map_err(|e| format!("cannot parse '{s}': {e}"))
}
