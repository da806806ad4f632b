//! JSON Schema to validated record type translator.
//!
//! `generate` turns a JSON Schema object into a [`RecordType`]: a table of
//! typed, constrained field descriptors. The record type constructs
//! [`Record`] instances from JSON objects and reports every violated field
//! at once when construction fails.
//!
//! ```no_run
//! use schema_modelgen::{generate, GenerateOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": {"type": "string"},
//!         "age": {"type": "integer", "minimum": 0}
//!     },
//!     "required": ["name", "age"]
//! });
//! let person = generate(&schema, &GenerateOptions::default()).unwrap();
//! let alice = person.construct(&json!({"name": "Alice", "age": 30})).unwrap();
//! assert_eq!(alice.field("name").and_then(|v| v.as_str()), Some("Alice"));
//! assert!(person.construct(&json!({"name": "Alice", "age": -1})).is_err());
//! ```

pub mod ast;
pub mod constraints;
pub mod enums;
pub mod error;
pub mod mapper;
pub mod meta;
pub mod options;
pub mod record;
pub mod translate;
pub mod value;

pub use ast::{DefaultValue, FieldDescriptor, FieldType, ItemType};
pub use constraints::Constraints;
pub use enums::EnumDescriptor;
pub use error::{Rule, TranslateError, ValidationFailure, Violation};
pub use options::{FormatPredicate, FormatValidators, GenerateOptions};
pub use record::{ExtraPolicy, Record, RecordType};
pub use translate::{generate, DEFAULT_MODEL_NAME};
pub use value::{FieldValue, ValueSet};
