/// Caller-facing configuration for `generate`.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::record::RecordType;
use crate::value::FieldValue;

/// Default nesting limit for records, sequences and `$ref` hops.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Predicate bound to a `format` name. Must be pure: it may run more than
/// once for the same value.
pub type FormatPredicate = Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>;

/// Custom format predicates keyed by `format` string.
#[derive(Clone, Default)]
pub struct FormatValidators {
    predicates: HashMap<String, FormatPredicate>,
}

impl FormatValidators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        format: impl Into<String>,
        predicate: impl Fn(&FieldValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicates.insert(format.into(), Arc::new(predicate));
        self
    }

    pub fn get(&self, format: &str) -> Option<&FormatPredicate> {
        self.predicates.get(format)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }
}

impl fmt::Debug for FormatValidators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_tuple("FormatValidators").field(&names).finish()
    }
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Check the schema against the draft-07 meta-schema first.
    pub validate_schema: bool,
    /// Overrides `title` and the `DynamicModel` fallback.
    pub model_name: Option<String>,
    pub format_validation: FormatValidators,
    pub max_depth: usize,
    refs: HashMap<String, Arc<RecordType>>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            validate_schema: true,
            model_name: None,
            format_validation: FormatValidators::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            refs: HashMap::new(),
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validate_schema(mut self, validate: bool) -> Self {
        self.validate_schema = validate;
        self
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    pub fn with_format_validation(mut self, validators: FormatValidators) -> Self {
        self.format_validation = validators;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Resolve `$ref: reference` to an already generated record type.
    pub fn register_ref(mut self, reference: impl Into<String>, ty: Arc<RecordType>) -> Self {
        self.refs.insert(reference.into(), ty);
        self
    }

    pub fn registered_ref(&self, reference: &str) -> Option<&Arc<RecordType>> {
        self.refs.get(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GenerateOptions::default();
        assert!(opts.validate_schema);
        assert_eq!(opts.model_name, None);
        assert!(opts.format_validation.is_empty());
        assert_eq!(opts.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_register_predicates() {
        let v = FormatValidators::new()
            .register("even", |v| v.as_i64().is_some_and(|n| n % 2 == 0))
            .register("never", |_| false);
        assert_eq!(v.len(), 2);
        let even = v.get("even").unwrap();
        assert!(even(&FieldValue::Integer(4)));
        assert!(!even(&FieldValue::Integer(3)));
        assert!(v.get("odd").is_none());
        assert_eq!(format!("{v:?}"), "FormatValidators([\"even\", \"never\"])");
    }
}
