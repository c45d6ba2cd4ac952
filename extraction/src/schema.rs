//! Output schemas: a compiled JSON Schema plus typed decoding.

use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while building an [`OutputSchema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The raw schema document is not a valid JSON Schema.
    #[error("schema failed to compile: {0}")]
    Compile(String),

    /// A schema could not be derived from a Rust type.
    #[error("schema could not be generated: {0}")]
    Generate(String),
}

/// The structured shape a backend reply must take.
///
/// Holds the raw schema document (forwarded to backends as a hint) and the
/// compiled validator. Cloning is cheap; both halves are shared.
#[derive(Clone)]
pub struct OutputSchema {
    raw: Arc<Value>,
    validator: Arc<jsonschema::Validator>,
}

impl OutputSchema {
    /// Compiles a raw JSON Schema document.
    pub fn new(raw: Value) -> Result<Self, SchemaError> {
        let validator =
            jsonschema::Validator::new(&raw).map_err(|e| SchemaError::Compile(e.to_string()))?;
        Ok(Self {
            raw: Arc::new(raw),
            validator: Arc::new(validator),
        })
    }

    /// Derives the schema from a Rust type using `schemars`.
    pub fn for_type<T: JsonSchema>() -> Result<Self, SchemaError> {
        let raw = serde_json::to_value(schemars::schema_for!(T))
            .map_err(|e| SchemaError::Generate(e.to_string()))?;
        Self::new(raw)
    }

    /// The raw schema document.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    /// Validates `instance`, collecting every violation rather than the first.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|error| {
                let path = error.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                format!("At path '{path}': {error}")
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates `instance` and decodes it into `T`.
    ///
    /// A value that passes the schema but cannot be decoded into `T` is
    /// reported the same way as a schema violation.
    pub fn validate_typed<T: DeserializeOwned>(&self, instance: &Value) -> Result<T, Vec<String>> {
        self.validate(instance)?;
        serde_json::from_value(instance.clone())
            .map_err(|e| vec![format!("Value does not match the expected type: {e}")])
    }
}

impl fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSchema").field("raw", &self.raw).finish()
    }
}

/// Joins validation messages into one readable block, one violation per line.
#[must_use]
pub fn prettify_errors(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("- {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn patterns_schema() -> OutputSchema {
        OutputSchema::new(json!({
            "type": "object",
            "properties": {
                "patterns": {"type": "array", "items": {"type": "string"}, "maxItems": 5}
            },
            "required": ["patterns"]
        }))
        .unwrap()
    }

    #[test]
    fn rejects_uncompilable_schema() {
        let result = OutputSchema::new(json!({"type": 42}));
        assert!(matches!(result, Err(SchemaError::Compile(_))));
    }

    #[test]
    fn collects_all_violations_with_paths() {
        let schema = OutputSchema::new(json!({
            "type": "object",
            "properties": {
                "word": {"type": "string"},
                "count": {"type": "integer", "minimum": 0}
            },
            "required": ["word", "count"]
        }))
        .unwrap();

        let errors = schema.validate(&json!({"count": -1})).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("word")));
        assert!(errors.iter().any(|e| e.contains("/count")));
    }

    #[test]
    fn max_items_is_enforced() {
        let schema = patterns_schema();
        assert!(schema.validate(&json!({"patterns": []})).is_ok());
        let too_many = json!({"patterns": ["a", "b", "c", "d", "e", "f"]});
        assert!(schema.validate(&too_many).is_err());
    }

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Translation {
        sentence: String,
        words: Vec<String>,
    }

    #[test]
    fn derived_schema_validates_and_decodes() {
        let schema = OutputSchema::for_type::<Translation>().unwrap();
        let value = json!({"sentence": "hola", "words": ["hola"]});
        let decoded: Translation = schema.validate_typed(&value).unwrap();
        assert_eq!(decoded.sentence, "hola");

        let errors = schema
            .validate_typed::<Translation>(&json!({"sentence": 3}))
            .unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn prettify_puts_one_error_per_line() {
        let text = prettify_errors(&["a".to_string(), "b".to_string()]);
        assert_eq!(text, "- a\n- b");
    }
}
