/// Translated field AST: the semantic types a schema property maps to and
/// the descriptors assembled from them. Immutable once built; nested record
/// types are shared through `Arc`.
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::constraints::Constraints;
use crate::enums::EnumDescriptor;
use crate::record::RecordType;

/// The seven `type` keywords of JSON Schema draft-07.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKeyword {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl TypeKeyword {
    pub const ALL: [TypeKeyword; 7] = [
        TypeKeyword::String,
        TypeKeyword::Number,
        TypeKeyword::Integer,
        TypeKeyword::Boolean,
        TypeKeyword::Array,
        TypeKeyword::Object,
        TypeKeyword::Null,
    ];

    pub fn parse(s: &str) -> Option<TypeKeyword> {
        match s {
            "string" => Some(TypeKeyword::String),
            "number" => Some(TypeKeyword::Number),
            "integer" => Some(TypeKeyword::Integer),
            "boolean" => Some(TypeKeyword::Boolean),
            "array" => Some(TypeKeyword::Array),
            "object" => Some(TypeKeyword::Object),
            "null" => Some(TypeKeyword::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKeyword::String => "string",
            TypeKeyword::Number => "number",
            TypeKeyword::Integer => "integer",
            TypeKeyword::Boolean => "boolean",
            TypeKeyword::Array => "array",
            TypeKeyword::Object => "object",
            TypeKeyword::Null => "null",
        }
    }
}

/// Semantic type of one field, dispatched on at construction time.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Date,
    DateTime,
    Time,
    Uuid,
    /// Accepts any JSON value unchanged.
    Any,
    Enum(EnumDescriptor),
    Record(Arc<RecordType>),
    List(Box<ItemType>),
    /// Deduplicated on construction; iteration order is unspecified.
    Set(Box<ItemType>),
}

impl FieldType {
    /// Short human-readable name used in violation messages.
    pub fn display_name(&self) -> String {
        match self {
            FieldType::String => "string".into(),
            FieldType::Integer => "integer".into(),
            FieldType::Float => "float".into(),
            FieldType::Boolean => "boolean".into(),
            FieldType::Null => "null".into(),
            FieldType::Date => "date".into(),
            FieldType::DateTime => "datetime".into(),
            FieldType::Time => "time".into(),
            FieldType::Uuid => "uuid".into(),
            FieldType::Any => "any".into(),
            FieldType::Enum(e) => e.name().to_string(),
            FieldType::Record(r) => r.name().to_string(),
            FieldType::List(item) => format!("list[{}]", item.ty.display_name()),
            FieldType::Set(item) => format!("set[{}]", item.ty.display_name()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Item type of a list or set field.
    pub fn item(&self) -> Option<&ItemType> {
        match self {
            FieldType::List(item) | FieldType::Set(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Arc<RecordType>> {
        match self {
            FieldType::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match self {
            FieldType::Enum(e) => Some(e),
            _ => None,
        }
    }
}

/// Element type of a sequence, with the constraints each element carries.
#[derive(Debug, Clone, Serialize)]
pub struct ItemType {
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

/// Default policy of a field: required, or a value used when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    Required,
    Value(Value),
}

/// One translated schema property.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    pub required: bool,
    pub default: DefaultValue,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

impl FieldDescriptor {
    pub fn description(&self) -> Option<&str> {
        self.constraints.description.as_deref()
    }

    /// The default used when the field is absent; `None` for required fields.
    pub fn default_value(&self) -> Option<&Value> {
        match &self.default {
            DefaultValue::Required => None,
            DefaultValue::Value(v) => Some(v),
        }
    }
}
