/// Generated record types and the generic record container they construct.
///
/// A `RecordType` is a descriptor table; `construct` walks that table,
/// dispatching on each field's semantic type, and gathers every violation
/// before reporting, so one failed construction lists all problems.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::ast::{FieldDescriptor, FieldType, ItemType};
use crate::constraints::Constraints;
use crate::error::{Rule, ValidationFailure, Violation};
use crate::options::FormatPredicate;
use crate::value::{
    object_to_json, parse_date, parse_datetime, parse_time, pointer_segment, FieldValue, ValueSet,
};

/// What happens to input keys no field declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPolicy {
    /// Retained on the record and readable through `Record::get`.
    Allow,
    /// Silently dropped.
    Ignore,
}

/// A caller predicate bound to one field through its `format`.
#[derive(Clone)]
pub struct CustomValidator {
    format: String,
    predicate: FormatPredicate,
}

impl CustomValidator {
    pub fn new(format: impl Into<String>, predicate: FormatPredicate) -> Self {
        Self {
            format: format.into(),
            predicate,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn accepts(&self, value: &FieldValue) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValidator")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Serialize for CustomValidator {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.format)
    }
}

/// A generated record type.
#[derive(Debug, Serialize)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDescriptor>,
    extra: ExtraPolicy,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    validators: BTreeMap<String, CustomValidator>,
}

impl RecordType {
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        extra: ExtraPolicy,
        validators: BTreeMap<String, CustomValidator>,
    ) -> Self {
        Self {
            name: name.into(),
            fields,
            extra,
            validators,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn extra_policy(&self) -> ExtraPolicy {
        self.extra
    }

    pub fn has_validator(&self, field: &str) -> bool {
        self.validators.contains_key(field)
    }

    pub fn validator(&self, field: &str) -> Option<&CustomValidator> {
        self.validators.get(field)
    }

    /// JSON description of the type for external tooling.
    pub fn describe(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Construct an instance from a JSON object.
    pub fn construct(&self, input: &Value) -> Result<Record, ValidationFailure> {
        let mut violations = Vec::new();
        let record = self.construct_at(input, "", &mut violations);
        self.finish(record, violations)
    }

    /// Construct an instance from an already split-out field map.
    pub fn construct_map(&self, input: &Map<String, Value>) -> Result<Record, ValidationFailure> {
        let mut violations = Vec::new();
        let record = self.construct_object(input, "", &mut violations);
        self.finish(Some(record), violations)
    }

    fn finish(
        &self,
        record: Option<Record>,
        violations: Vec<Violation>,
    ) -> Result<Record, ValidationFailure> {
        match record {
            Some(record) if violations.is_empty() => Ok(record),
            _ => {
                debug!(model = %self.name, violations = violations.len(), "construction failed");
                Err(ValidationFailure {
                    model: self.name.clone(),
                    violations,
                })
            }
        }
    }

    fn construct_at(&self, input: &Value, path: &str, out: &mut Vec<Violation>) -> Option<Record> {
        match input.as_object() {
            Some(obj) => {
                let before = out.len();
                let record = self.construct_object(obj, path, out);
                (out.len() == before).then_some(record)
            }
            None => {
                out.push(type_violation(path, input, &self.name));
                None
            }
        }
    }

    fn construct_object(
        &self,
        input: &Map<String, Value>,
        path: &str,
        out: &mut Vec<Violation>,
    ) -> Record {
        let mut values = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let field_path = format!("{path}/{}", pointer_segment(&field.name));
            let value = match input.get(&field.name) {
                Some(raw) => check_value(&field.ty, &field.constraints, raw, &field_path, out)
                    .and_then(|value| self.run_validator(field, value, raw, &field_path, out)),
                None => match field.default_value() {
                    Some(default) => Some(FieldValue::from_json(default)),
                    None => {
                        out.push(Violation {
                            instance_path: field_path,
                            rule: Rule::Missing,
                            value: Value::Null,
                            message: format!("field '{}' is required", field.name),
                        });
                        None
                    }
                },
            };
            if let Some(value) = value {
                values.push((field.name.clone(), value));
            }
        }

        let mut extra = Map::new();
        if self.extra == ExtraPolicy::Allow {
            for (key, value) in input {
                if self.field(key).is_none() {
                    extra.insert(key.clone(), value.clone());
                }
            }
        }

        Record {
            type_name: self.name.clone(),
            values,
            extra,
        }
    }

    fn run_validator(
        &self,
        field: &FieldDescriptor,
        value: FieldValue,
        raw: &Value,
        path: &str,
        out: &mut Vec<Violation>,
    ) -> Option<FieldValue> {
        match self.validators.get(&field.name) {
            Some(v) if !v.accepts(&value) => {
                out.push(Violation {
                    instance_path: path.to_string(),
                    rule: Rule::Format,
                    value: raw.clone(),
                    message: format!(
                        "invalid value for format '{}' in field '{}': {}",
                        v.format, field.name, value
                    ),
                });
                None
            }
            _ => Some(value),
        }
    }
}

/// Validate one raw value against a type and its constraints.
fn check_value(
    ty: &FieldType,
    constraints: &Constraints,
    raw: &Value,
    path: &str,
    out: &mut Vec<Violation>,
) -> Option<FieldValue> {
    let value = match ty {
        FieldType::Any => Some(FieldValue::Json(raw.clone())),
        FieldType::Null => raw.is_null().then_some(FieldValue::Null),
        FieldType::Boolean => raw.as_bool().map(FieldValue::Bool),
        FieldType::Integer => as_integer(raw).map(FieldValue::Integer),
        FieldType::Float => raw.as_f64().map(FieldValue::Float),
        FieldType::String => raw.as_str().map(FieldValue::from),
        FieldType::Date => parse_str(raw, parse_date).map(FieldValue::Date),
        FieldType::DateTime => parse_str(raw, parse_datetime).map(FieldValue::DateTime),
        FieldType::Time => parse_str(raw, parse_time).map(FieldValue::Time),
        FieldType::Uuid => parse_str(raw, uuid::Uuid::parse_str).map(FieldValue::Uuid),
        FieldType::Enum(e) => match e.lookup(raw) {
            Some(v) => Some(v.clone()),
            None => {
                let allowed: Vec<String> = e.members().iter().map(|m| m.raw.to_string()).collect();
                out.push(Violation {
                    instance_path: path.to_string(),
                    rule: Rule::Enum,
                    value: raw.clone(),
                    message: format!("input should be one of {}", allowed.join(", ")),
                });
                return None;
            }
        },
        FieldType::Record(rt) => return rt.construct_at(raw, path, out).map(FieldValue::Record),
        FieldType::List(item) => {
            return check_sequence(item, constraints, raw, path, out).map(FieldValue::List)
        }
        FieldType::Set(item) => {
            let items = check_sequence(item, &Constraints::default(), raw, path, out)?;
            let set: ValueSet = items.into_iter().collect();
            return check_length(constraints, set.len(), raw, path, "items", out)
                .then_some(FieldValue::Set(set));
        }
    };

    let Some(value) = value else {
        out.push(type_violation(path, raw, &ty.display_name()));
        return None;
    };

    let ok = match &value {
        FieldValue::Integer(_) | FieldValue::Float(_) => {
            check_bounds(constraints, value.as_f64().unwrap_or(f64::NAN), raw, path, out)
        }
        FieldValue::String(s) => check_string(constraints, s, raw, path, out),
        _ => true,
    };
    ok.then_some(value)
}

fn check_sequence(
    item: &ItemType,
    constraints: &Constraints,
    raw: &Value,
    path: &str,
    out: &mut Vec<Violation>,
) -> Option<Vec<FieldValue>> {
    let Some(elements) = raw.as_array() else {
        out.push(type_violation(path, raw, "array"));
        return None;
    };

    let length_ok = check_length(constraints, elements.len(), raw, path, "items", out);

    let mut values = Vec::with_capacity(elements.len());
    let mut all_ok = true;
    for (i, element) in elements.iter().enumerate() {
        match check_value(&item.ty, &item.constraints, element, &format!("{path}/{i}"), out) {
            Some(v) => values.push(v),
            None => all_ok = false,
        }
    }

    (length_ok && all_ok).then_some(values)
}

fn check_bounds(c: &Constraints, n: f64, raw: &Value, path: &str, out: &mut Vec<Violation>) -> bool {
    let checks = [
        (c.gt, Rule::Gt, "greater than", n > c.gt.unwrap_or(f64::NAN)),
        (c.ge, Rule::Ge, "greater than or equal to", n >= c.ge.unwrap_or(f64::NAN)),
        (c.lt, Rule::Lt, "less than", n < c.lt.unwrap_or(f64::NAN)),
        (c.le, Rule::Le, "less than or equal to", n <= c.le.unwrap_or(f64::NAN)),
    ];
    let mut ok = true;
    for (bound, rule, phrase, passed) in checks {
        if let Some(bound) = bound {
            if !passed {
                out.push(Violation {
                    instance_path: path.to_string(),
                    rule,
                    value: raw.clone(),
                    message: format!("input should be {phrase} {bound}"),
                });
                ok = false;
            }
        }
    }
    ok
}

fn check_string(c: &Constraints, s: &str, raw: &Value, path: &str, out: &mut Vec<Violation>) -> bool {
    let mut ok = check_length(c, s.chars().count(), raw, path, "characters", out);
    if let Some(re) = &c.pattern {
        if !re.is_match(s) {
            out.push(Violation {
                instance_path: path.to_string(),
                rule: Rule::Pattern,
                value: raw.clone(),
                message: format!("string should match pattern '{}'", re.as_str()),
            });
            ok = false;
        }
    }
    ok
}

fn check_length(
    c: &Constraints,
    len: usize,
    raw: &Value,
    path: &str,
    unit: &str,
    out: &mut Vec<Violation>,
) -> bool {
    let mut ok = true;
    if let Some(min) = c.min_length.filter(|min| len < *min) {
        out.push(Violation {
            instance_path: path.to_string(),
            rule: Rule::MinLength,
            value: raw.clone(),
            message: format!("should have at least {min} {unit}, found {len}"),
        });
        ok = false;
    }
    if let Some(max) = c.max_length.filter(|max| len > *max) {
        out.push(Violation {
            instance_path: path.to_string(),
            rule: Rule::MaxLength,
            value: raw.clone(),
            message: format!("should have at most {max} {unit}, found {len}"),
        });
        ok = false;
    }
    ok
}

/// Integers, including floats with no fractional part.
/// Values outside the `i64` range are rejected rather than saturated.
fn as_integer(raw: &Value) -> Option<i64> {
    if let Some(n) = raw.as_i64() {
        return Some(n);
    }
    if raw.is_u64() {
        return None;
    }
    // 2^63 is exact in f64; `i64::MAX as f64` rounds up to it.
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    raw.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < UPPER)
        .map(|f| f as i64)
}

fn parse_str<T, E>(raw: &Value, parse: impl Fn(&str) -> Result<T, E>) -> Option<T> {
    raw.as_str().and_then(|s| parse(s).ok())
}

fn type_violation(path: &str, raw: &Value, expected: &str) -> Violation {
    Violation {
        instance_path: path.to_string(),
        rule: Rule::Type,
        value: raw.clone(),
        message: format!("input should be a valid {expected}"),
    }
}

/// A constructed, validated instance of a `RecordType`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    values: Vec<(String, FieldValue)>,
    extra: Map<String, Value>,
}

impl Record {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared field by name, falling back to retained extra fields.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.field(name)
            .cloned()
            .or_else(|| self.extra.get(name).map(|v| FieldValue::Json(v.clone())))
    }

    /// Declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn to_json(&self) -> Value {
        object_to_json(&self.values, &self.extra)
    }
}
