/// Error types for the two phases of a record type's life: translation
/// (schema shape problems, fail-fast) and construction (instance problems,
/// aggregated per instance).
use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("schema is invalid at '{path}': {message}")]
    SchemaInvalid { path: String, message: String },
    #[error("schema at '{path}' must be a JSON object")]
    NotAnObject { path: String },
    #[error("unsupported type '{value}' for property '{property}'")]
    UnsupportedType { property: String, value: String },
    #[error("error converting enum values for property '{property}': {message}")]
    EnumConversion { property: String, message: String },
    #[error("invalid pattern for property '{property}': {source}")]
    InvalidPattern {
        property: String,
        #[source]
        source: regex::Error,
    },
    #[error("cannot resolve $ref '{reference}' for property '{property}'")]
    UnresolvedRef { property: String, reference: String },
    #[error("schema nesting exceeds depth {limit} at '{path}'")]
    DepthExceeded { path: String, limit: usize },
}

/// The rule a supplied value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Missing,
    Type,
    Enum,
    Gt,
    Ge,
    Lt,
    Le,
    Pattern,
    MinLength,
    MaxLength,
    Format,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Missing => "missing",
            Rule::Type => "type",
            Rule::Enum => "enum",
            Rule::Gt => "gt",
            Rule::Ge => "ge",
            Rule::Lt => "lt",
            Rule::Le => "le",
            Rule::Pattern => "pattern",
            Rule::MinLength => "min_length",
            Rule::MaxLength => "max_length",
            Rule::Format => "format",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated rule at one location in the supplied instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// JSON Pointer to the offending value (`/friends/1/age`).
    pub instance_path: String,
    pub rule: Rule,
    /// The supplied value, `null` when the field was missing.
    pub value: Value,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.instance_path.is_empty() {
            "(root)"
        } else {
            &self.instance_path
        };
        write!(f, "{path} [{}]: {}", self.rule, self.message)
    }
}

/// Every violation found while constructing one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    pub model: String,
    pub violations: Vec<Violation>,
}

impl ValidationFailure {
    /// Returns true if any violation sits exactly at `instance_path`.
    pub fn has_path(&self, instance_path: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.instance_path == instance_path)
    }

    /// Violations at `instance_path`, in discovery order.
    pub fn at<'a>(&'a self, instance_path: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations
            .iter()
            .filter(move |v| v.instance_path == instance_path)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.violations.len();
        write!(
            f,
            "{n} validation error{} for {}",
            if n == 1 { "" } else { "s" },
            self.model
        )?;
        for v in &self.violations {
            write!(f, "\n  {v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violation(path: &str, rule: Rule) -> Violation {
        Violation {
            instance_path: path.into(),
            rule,
            value: json!(null),
            message: "bad".into(),
        }
    }

    #[test]
    fn test_violation_display_root() {
        assert_eq!(violation("", Rule::Type).to_string(), "(root) [type]: bad");
    }

    #[test]
    fn test_failure_display_lists_every_violation() {
        let failure = ValidationFailure {
            model: "Person".into(),
            violations: vec![violation("/name", Rule::Missing), violation("/age", Rule::Ge)],
        };
        assert_eq!(
            failure.to_string(),
            "2 validation errors for Person\n  /name [missing]: bad\n  /age [ge]: bad"
        );
        assert!(failure.has_path("/age"));
        assert!(!failure.has_path("/other"));
        assert_eq!(failure.at("/name").count(), 1);
    }

    #[test]
    fn test_translate_error_names_property() {
        let err = TranslateError::UnsupportedType {
            property: "age".into(),
            value: "decimal".into(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported type 'decimal' for property 'age'"
        );
    }
}
