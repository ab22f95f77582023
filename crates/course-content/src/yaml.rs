//! YAML to JSON conversion
//!
//! Course documents are authored in YAML but every downstream consumer (the
//! hasher, the remote API) speaks JSON. Values without a JSON counterpart are
//! coerced to strings: non-string mapping keys, and non-finite floats.

use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

use crate::error::{Error, Result};

/// Parse YAML source into a JSON value.
pub fn parse(source: &str) -> Result<Value> {
    let value: YamlValue =
        serde_yaml::from_str(source).map_err(|e| Error::parse("YAML", e.to_string()))?;
    Ok(to_json(&value))
}

/// Parse YAML source, keeping the document's own mapping order.
pub fn parse_ordered(source: &str) -> Result<YamlValue> {
    serde_yaml::from_str(source).map_err(|e| Error::parse("YAML", e.to_string()))
}

/// Convert a YAML value into JSON.
pub fn to_json(value: &YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(n.to_string()))
            } else {
                Value::String(n.to_string())
            }
        }
        YamlValue::String(s) => Value::String(s.clone()),
        YamlValue::Sequence(items) => Value::Array(items.iter().map(to_json).collect()),
        YamlValue::Mapping(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(key_string(k), to_json(v));
            }
            Value::Object(out)
        }
        YamlValue::Tagged(tagged) => to_json(&tagged.value),
    }
}

/// Render a mapping key as a string.
pub fn key_string(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Tagged(tagged) => key_string(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Coerce a scalar value to its display string; `None` for null.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn converts_nested_documents() {
        let value = parse("title: Quiz 1\nquestions:\n  - text: What?\n    points: 2\n").unwrap();
        assert_eq!(
            value,
            json!({"title": "Quiz 1", "questions": [{"text": "What?", "points": 2}]})
        );
    }

    #[test]
    fn non_string_keys_become_strings() {
        let value = parse("1: one\ntrue: yes\n").unwrap();
        assert_eq!(value, json!({"1": "one", "true": "yes"}));
    }

    #[test]
    fn non_finite_floats_become_strings() {
        let value = parse("x: .nan\n").unwrap();
        assert!(value["x"].is_string());
    }

    #[test]
    fn parse_error_is_reported() {
        assert!(matches!(parse("a: [1"), Err(Error::ParseError { .. })));
    }

    #[test]
    fn scalar_string_coerces_numbers() {
        assert_eq!(scalar_string(&json!(42)), Some("42".to_string()));
        assert_eq!(scalar_string(&json!(true)), Some("true".to_string()));
        assert_eq!(scalar_string(&json!("x")), Some("x".to_string()));
        assert_eq!(scalar_string(&Value::Null), None);
    }
}
