/// Runtime values held by constructed records, plus the temporal parsers
/// shared by enum coercion and field validation.
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::record::Record;

/// A validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Time(NaiveTime),
    Uuid(Uuid),
    List(Vec<FieldValue>),
    Set(ValueSet),
    Record(Record),
    /// Unvalidated JSON: `Any` fields and retained extra fields.
    Json(Value),
}

impl FieldValue {
    /// Untyped conversion used for defaults and pass-through enum literals.
    pub fn from_json(value: &Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s.clone()),
            other => FieldValue::Json(other.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            FieldValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
            FieldValue::Uuid(u) => Value::String(u.to_string()),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Set(set) => Value::Array(set.iter().map(FieldValue::to_json).collect()),
            FieldValue::Record(r) => r.to_json(),
            FieldValue::Json(v) => v.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            FieldValue::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(s)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Deduplicated collection backing `uniqueItems` fields. Equality ignores
/// order.
#[derive(Debug, Clone, Default)]
pub struct ValueSet(Vec<FieldValue>);

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` unless an equal value is already present.
    pub fn insert(&mut self, value: FieldValue) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    pub fn contains(&self, value: &FieldValue) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldValue> {
        self.0.iter()
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl FromIterator<FieldValue> for ValueSet {
    fn from_iter<I: IntoIterator<Item = FieldValue>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a FieldValue;
    type IntoIter = std::slice::Iter<'a, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── Temporal parsing ───────────────────────────────────────────────────

/// RFC 3339 date-time; a missing offset is read as UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).or_else(|_| {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

/// Full date; a date-time string is accepted and truncated to its date.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|err| parse_datetime(s).map(|dt| dt.date_naive()).map_err(|_| err))
}

/// Partial time with optional fractional seconds; a trailing `Z` is accepted.
pub fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    let s = s.strip_suffix('Z').unwrap_or(s);
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
}

/// Object keys become JSON Pointer segments.
pub(crate) fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

pub(crate) fn object_to_json(fields: &[(String, FieldValue)], extra: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    for (name, value) in fields {
        out.insert(name.clone(), value.to_json());
    }
    for (name, value) in extra {
        out.insert(name.clone(), value.clone());
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(FieldValue::from_json(&json!(3)), FieldValue::Integer(3));
        assert_eq!(FieldValue::from_json(&json!(2.5)), FieldValue::Float(2.5));
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Null);
        assert_eq!(
            FieldValue::from_json(&json!([1])),
            FieldValue::Json(json!([1]))
        );
    }

    #[test]
    fn test_set_dedups_and_ignores_order() {
        let a: ValueSet = ["red", "green", "red"].into_iter().map(FieldValue::from).collect();
        let b: ValueSet = ["green", "red"].into_iter().map(FieldValue::from).collect();
        assert_eq!(a.len(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_datetime_with_and_without_offset() {
        let with = parse_datetime("2024-06-08T10:30:00+02:00").unwrap();
        assert_eq!(with.offset().local_minus_utc(), 7200);
        let naive = parse_datetime("2024-06-08T10:30:00").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_parse_date_accepts_datetime() {
        let d = NaiveDate::from_ymd_opt(2000, 1, 2).unwrap();
        assert_eq!(parse_date("2000-01-02").unwrap(), d);
        assert_eq!(parse_date("2000-01-02T08:00:00Z").unwrap(), d);
        assert!(parse_date("2000-13-02").is_err());
    }

    #[test]
    fn test_parse_time() {
        let t = NaiveTime::from_hms_opt(8, 15, 0).unwrap();
        assert_eq!(parse_time("08:15:00").unwrap(), t);
        assert_eq!(parse_time("08:15:00Z").unwrap(), t);
        assert_eq!(parse_time("08:15").unwrap(), t);
    }

    #[test]
    fn test_temporal_to_json() {
        let d = FieldValue::Date(NaiveDate::from_ymd_opt(2024, 6, 8).unwrap());
        assert_eq!(d.to_json(), json!("2024-06-08"));
    }

    #[test]
    fn test_pointer_segment_escapes() {
        assert_eq!(pointer_segment("a/b~c"), "a~1b~0c");
    }
}
