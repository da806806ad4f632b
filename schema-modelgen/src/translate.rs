/// Schema translator: walks a JSON Schema object and assembles the record
/// type, recursing into nested objects, sequences and `$ref` targets.
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::ast::{DefaultValue, FieldDescriptor, FieldType, ItemType};
use crate::constraints::{extract_constraints, Constraints};
use crate::error::TranslateError;
use crate::mapper::{map_type, MappedType};
use crate::meta;
use crate::options::GenerateOptions;
use crate::record::{CustomValidator, ExtraPolicy, RecordType};
use crate::value::pointer_segment;

/// Name used when neither the options nor the schema `title` give one.
pub const DEFAULT_MODEL_NAME: &str = "DynamicModel";

/// Translate `schema` into a record type.
pub fn generate(
    schema: &Value,
    options: &GenerateOptions,
) -> Result<Arc<RecordType>, TranslateError> {
    if options.validate_schema {
        meta::validate(schema)?;
    }

    let root_name = options
        .model_name
        .clone()
        .or_else(|| schema.get("title").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

    let translator = Translator {
        root: schema,
        root_name: &root_name,
        options,
    };
    let record = translator.record(schema, root_name.clone(), Scope::root())?;
    debug!(model = %record.name(), fields = record.fields().len(), "generated record type");
    Ok(record)
}

/// Position of the translator in the schema tree.
#[derive(Debug, Clone)]
struct Scope {
    /// JSON Pointer of the node being translated.
    path: String,
    depth: usize,
}

impl Scope {
    fn root() -> Self {
        Self {
            path: String::new(),
            depth: 0,
        }
    }

    fn child(&self, suffix: &str) -> Self {
        Self {
            path: format!("{}{suffix}", self.path),
            depth: self.depth + 1,
        }
    }
}

struct Translator<'a> {
    root: &'a Value,
    root_name: &'a str,
    options: &'a GenerateOptions,
}

impl Translator<'_> {
    fn guard(&self, scope: &Scope) -> Result<(), TranslateError> {
        if scope.depth > self.options.max_depth {
            return Err(TranslateError::DepthExceeded {
                path: scope.path.clone(),
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    /// Model assembler: one field per property, in declaration order.
    fn record(
        &self,
        schema: &Value,
        name: String,
        scope: Scope,
    ) -> Result<Arc<RecordType>, TranslateError> {
        self.guard(&scope)?;
        let obj = schema.as_object().ok_or_else(|| TranslateError::NotAnObject {
            path: scope.path.clone(),
        })?;

        let empty = Map::new();
        let properties = match obj.get("properties") {
            Some(Value::Object(props)) => props,
            Some(_) => {
                return Err(TranslateError::SchemaInvalid {
                    path: format!("{}/properties", scope.path),
                    message: "'properties' must be an object".into(),
                })
            }
            None => &empty,
        };
        let required: Vec<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut fields = Vec::with_capacity(properties.len());
        let mut validators = BTreeMap::new();
        for (prop_name, node) in properties {
            let is_required = required.contains(&prop_name.as_str());
            let prop_scope = Scope {
                path: format!("{}/properties/{}", scope.path, pointer_segment(prop_name)),
                depth: scope.depth,
            };
            trace!(model = %name, property = %prop_name, required = is_required, "assembling field");
            fields.push(self.field(prop_name, node, is_required, &prop_scope)?);

            if let Some(format) = node.get("format").and_then(Value::as_str) {
                if let Some(predicate) = self.options.format_validation.get(format) {
                    validators.insert(
                        prop_name.clone(),
                        CustomValidator::new(format, predicate.clone()),
                    );
                }
            }
        }

        let extra = match obj.get("additionalProperties") {
            Some(Value::Bool(true)) => ExtraPolicy::Allow,
            // An empty schema object counts as unset.
            Some(Value::Object(m)) if !m.is_empty() => ExtraPolicy::Allow,
            _ => ExtraPolicy::Ignore,
        };

        Ok(Arc::new(RecordType::new(name, fields, extra, validators)))
    }

    /// Field assembler.
    fn field(
        &self,
        prop_name: &str,
        node: &Value,
        required: bool,
        scope: &Scope,
    ) -> Result<FieldDescriptor, TranslateError> {
        let (ty, constraints) = self.field_type(prop_name, node, scope)?;
        let default = if required {
            DefaultValue::Required
        } else {
            DefaultValue::Value(node.get("default").cloned().unwrap_or(Value::Null))
        };
        Ok(FieldDescriptor {
            name: prop_name.to_string(),
            ty,
            required,
            default,
            constraints,
        })
    }

    /// Semantic type and constraints of one node, shared by properties and
    /// sequence items.
    fn field_type(
        &self,
        prop_name: &str,
        node: &Value,
        scope: &Scope,
    ) -> Result<(FieldType, Constraints), TranslateError> {
        if !node.is_object() {
            return Err(TranslateError::NotAnObject {
                path: scope.path.clone(),
            });
        }

        if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
            return self.resolve_ref(prop_name, reference, node, scope);
        }

        let mapped = map_type(prop_name, node)?;
        let constraints = extract_constraints(prop_name, node, &mapped)?;
        let ty = match mapped {
            MappedType::Resolved(ty) => ty,
            MappedType::Record => {
                let nested = self.record(node, format!("{prop_name}Item"), scope.child(""))?;
                FieldType::Record(nested)
            }
            MappedType::Sequence => self.sequence(prop_name, node, &constraints, scope)?,
        };
        Ok((ty, constraints))
    }

    /// Resolve `items` into a list or set type.
    fn sequence(
        &self,
        prop_name: &str,
        node: &Value,
        constraints: &Constraints,
        scope: &Scope,
    ) -> Result<FieldType, TranslateError> {
        let default_items = Value::Object(Map::new());
        let items = node.get("items").unwrap_or(&default_items);
        let item_scope = scope.child("/items");
        self.guard(&item_scope)?;
        let item_name = format!("{prop_name}_item");

        let item = if items.get("type").and_then(Value::as_str) == Some("object")
            && items.get("$ref").is_none()
        {
            let nested = self.record(items, format!("{item_name}Item"), item_scope)?;
            ItemType {
                ty: FieldType::Record(nested),
                constraints: Constraints::default(),
            }
        } else {
            let (ty, constraints) = self.field_type(&item_name, items, &item_scope)?;
            ItemType { ty, constraints }
        };

        Ok(if constraints.is_unique() {
            FieldType::Set(Box::new(item))
        } else {
            FieldType::List(Box::new(item))
        })
    }

    /// Registered record types first, then local JSON Pointers.
    fn resolve_ref(
        &self,
        prop_name: &str,
        reference: &str,
        node: &Value,
        scope: &Scope,
    ) -> Result<(FieldType, Constraints), TranslateError> {
        let ref_scope = scope.child("/$ref");
        self.guard(&ref_scope)?;
        // Only the description of the referencing node survives.
        let constraints = extract_constraints(prop_name, node, &MappedType::Resolved(FieldType::Any))?;

        if let Some(registered) = self.options.registered_ref(reference) {
            trace!(property = %prop_name, reference, "using registered record type");
            return Ok((FieldType::Record(registered.clone()), constraints));
        }

        let unresolved = || TranslateError::UnresolvedRef {
            property: prop_name.to_string(),
            reference: reference.to_string(),
        };
        let pointer = reference.strip_prefix('#').ok_or_else(unresolved)?;
        let target = self.root.pointer(pointer).ok_or_else(unresolved)?;
        trace!(property = %prop_name, reference, "resolved local reference");

        if is_object_schema(target) {
            let name = ref_name(pointer).unwrap_or_else(|| self.root_name.to_string());
            let record = self.record(target, name, ref_scope)?;
            Ok((FieldType::Record(record), constraints))
        } else {
            let (ty, target_constraints) = self.field_type(prop_name, target, &ref_scope)?;
            Ok((ty, merge_description(target_constraints, constraints)))
        }
    }
}

fn is_object_schema(node: &Value) -> bool {
    node.get("type").and_then(Value::as_str) == Some("object") || node.get("properties").is_some()
}

/// Last pointer segment, unescaped: `/definitions/Person` -> `Person`.
fn ref_name(pointer: &str) -> Option<String> {
    pointer
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
}

fn merge_description(mut target: Constraints, referencing: Constraints) -> Constraints {
    if referencing.description.is_some() {
        target.description = referencing.description;
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FormatValidators;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn gen(schema: Value) -> Arc<RecordType> {
        generate(&schema, &GenerateOptions::default()).unwrap()
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let rt = gen(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"},
                "active": {"type": "boolean"}
            }
        }));
        let names: Vec<&str> = rt.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "active"]);
    }

    #[test]
    fn test_model_name_resolution() {
        let schema = json!({"title": "Person", "type": "object", "properties": {}});
        assert_eq!(gen(schema.clone()).name(), "Person");
        let named = generate(&schema, &GenerateOptions::new().with_model_name("Human")).unwrap();
        assert_eq!(named.name(), "Human");
        assert_eq!(gen(json!({"type": "object"})).name(), DEFAULT_MODEL_NAME);
    }

    #[test]
    fn test_required_and_defaults() {
        let rt = gen(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "role": {"type": "string", "default": "member"},
                "nick": {"type": "string"}
            },
            "required": ["name"]
        }));
        assert_eq!(rt.field("name").unwrap().default, DefaultValue::Required);
        assert_eq!(rt.field("role").unwrap().default_value(), Some(&json!("member")));
        assert_eq!(rt.field("nick").unwrap().default_value(), Some(&Value::Null));
    }

    #[test]
    fn test_nested_object_named_item() {
        let rt = gen(json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "properties": {"street": {"type": "string"}},
                    "required": ["street"]
                }
            }
        }));
        let nested = rt.field("address").unwrap().ty.as_record().unwrap();
        assert_eq!(nested.name(), "addressItem");
        assert!(nested.field("street").unwrap().required);
    }

    #[test]
    fn test_array_of_objects_named_item_item() {
        let rt = gen(json!({
            "type": "object",
            "properties": {
                "friends": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"name": {"type": "string"}}}
                }
            }
        }));
        let item = rt.field("friends").unwrap().ty.item().unwrap();
        assert_eq!(item.ty.as_record().unwrap().name(), "friends_itemItem");
    }

    #[test]
    fn test_scalar_items_keep_constraints() {
        let rt = gen(json!({
            "type": "object",
            "properties": {
                "some_array": {"type": "array", "items": {"type": "integer", "minimum": 2, "maximum": 3}}
            }
        }));
        let field = rt.field("some_array").unwrap();
        assert!(matches!(field.ty, FieldType::List(_)));
        let item = field.ty.item().unwrap();
        assert!(matches!(item.ty, FieldType::Integer));
        assert_eq!(item.constraints.names(), vec!["ge", "le"]);
    }

    #[test]
    fn test_unique_items_make_a_set() {
        let rt = gen(json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "string"}, "uniqueItems": true}}
        }));
        assert!(matches!(rt.field("tags").unwrap().ty, FieldType::Set(_)));
    }

    #[test]
    fn test_missing_items_is_any() {
        let rt = gen(json!({"type": "object", "properties": {"bag": {"type": "array"}}}));
        assert!(matches!(rt.field("bag").unwrap().ty.item().unwrap().ty, FieldType::Any));
    }

    #[test]
    fn test_item_enum_name() {
        let rt = gen(json!({
            "type": "object",
            "properties": {"colors": {"type": "array", "items": {"enum": ["red", "blue"]}}}
        }));
        let item = rt.field("colors").unwrap().ty.item().unwrap();
        assert_eq!(item.ty.as_enum().unwrap().name(), "colors_itemEnum");
    }

    #[test]
    fn test_additional_properties_policy() {
        let allow = gen(json!({"type": "object", "additionalProperties": true}));
        assert_eq!(allow.extra_policy(), ExtraPolicy::Allow);
        let schema_valued = gen(json!({"type": "object", "additionalProperties": {"type": "string"}}));
        assert_eq!(schema_valued.extra_policy(), ExtraPolicy::Allow);
        let ignore = gen(json!({"type": "object", "additionalProperties": false}));
        assert_eq!(ignore.extra_policy(), ExtraPolicy::Ignore);
        let empty_schema = gen(json!({"type": "object", "additionalProperties": {}}));
        assert_eq!(empty_schema.extra_policy(), ExtraPolicy::Ignore);
    }

    #[test]
    fn test_validators_bound_by_format() {
        let opts = GenerateOptions::new().with_format_validation(
            FormatValidators::new().register("even", |v| v.as_i64().is_some_and(|n| n % 2 == 0)),
        );
        let rt = generate(
            &json!({
                "type": "object",
                "properties": {
                    "n": {"type": "integer", "format": "even"},
                    "m": {"type": "integer", "format": "odd"}
                }
            }),
            &opts,
        )
        .unwrap();
        assert!(rt.has_validator("n"));
        assert!(!rt.has_validator("m"));
        assert_eq!(rt.validator("n").map(|v| v.format()), Some("even"));
    }

    #[test]
    fn test_unsupported_type_aborts() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "decimal"}}});
        let opts = GenerateOptions::new().with_validate_schema(false);
        assert!(matches!(
            generate(&schema, &opts),
            Err(TranslateError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_schema_invalid_before_translation() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "decimal"}}});
        assert!(matches!(
            generate(&schema, &GenerateOptions::default()),
            Err(TranslateError::SchemaInvalid { .. })
        ));
    }

    #[test]
    fn test_local_ref_resolves_definition() {
        let rt = gen(json!({
            "type": "object",
            "properties": {
                "person": {"$ref": "#/definitions/Person", "description": "owner"},
                "people": {"type": "array", "items": {"$ref": "#/definitions/Person"}},
                "code": {"$ref": "#/definitions/Code"}
            },
            "definitions": {
                "Person": {"type": "object", "properties": {"name": {"type": "string"}}},
                "Code": {"type": "string", "maxLength": 4}
            }
        }));
        let person = rt.field("person").unwrap();
        assert_eq!(person.ty.as_record().unwrap().name(), "Person");
        assert_eq!(person.description(), Some("owner"));
        let item = rt.field("people").unwrap().ty.item().unwrap();
        assert_eq!(item.ty.as_record().unwrap().name(), "Person");
        let code = rt.field("code").unwrap();
        assert!(matches!(code.ty, FieldType::String));
        assert_eq!(code.constraints.max_length, Some(4));
    }

    #[test]
    fn test_registered_ref() {
        let address = gen(json!({"title": "Address", "type": "object", "properties": {"city": {"type": "string"}}}));
        let opts = GenerateOptions::new().register_ref("https://example.com/address.json", address);
        let rt = generate(
            &json!({
                "type": "object",
                "properties": {"home": {"$ref": "https://example.com/address.json"}}
            }),
            &opts,
        )
        .unwrap();
        assert_eq!(rt.field("home").unwrap().ty.as_record().unwrap().name(), "Address");
    }

    #[test]
    fn test_unresolved_ref() {
        let err = generate(
            &json!({"type": "object", "properties": {"p": {"$ref": "#/definitions/Missing"}}}),
            &GenerateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TranslateError::UnresolvedRef { ref reference, .. } if reference == "#/definitions/Missing"));
    }

    #[test]
    fn test_cyclic_ref_hits_depth_guard() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "children": {"type": "array", "items": {"$ref": "#"}}
            }
        });
        let err = generate(&schema, &GenerateOptions::new().with_max_depth(8)).unwrap_err();
        match err {
            TranslateError::DepthExceeded { limit, path } => {
                assert_eq!(limit, 8);
                assert!(path.starts_with("/properties/children/items"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_ref_name() {
        assert_eq!(ref_name("/definitions/Person"), Some("Person".into()));
        assert_eq!(ref_name("/$defs/a~1b"), Some("a/b".into()));
        assert_eq!(ref_name(""), None);
    }
}
