//! JSON helpers shared by the codecs, tools and scorers

use serde_json::Value;

/// Loose truthiness of a JSON value.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy; every other value,
/// including empty arrays and objects, is truthy. Upstream services that
/// report flags as `0`/`1` or strings are read through this.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Truthiness of an optional field, absent counting as falsy
pub fn truthy_field(object: &Value, key: &str) -> bool {
    object.get(key).map(truthy).unwrap_or(false)
}

/// Serialize a value without whitespace
pub fn to_compact_string(value: &Value) -> String {
    value.to_string()
}

/// Locate the JSON object inside a model reply.
///
/// Models often wrap JSON in prose or markdown fences; this returns the
/// slice from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(0.0)));
        assert!(!truthy(&json!("")));

        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("0")));
        assert!(truthy(&json!([])));
        assert!(truthy(&json!({})));
    }

    #[test]
    fn test_truthy_field_missing() {
        let obj = json!({"a": 1});
        assert!(truthy_field(&obj, "a"));
        assert!(!truthy_field(&obj, "b"));
    }

    #[test]
    fn test_compact_string() {
        assert_eq!(to_compact_string(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
        assert_eq!(to_compact_string(&json!("hi")), r#""hi""#);
    }

    #[test]
    fn test_extract_json_object() {
        let reply = "Sure!\n```json\n{\"accurate\": true}\n```";
        assert_eq!(extract_json_object(reply), Some("{\"accurate\": true}"));
        assert_eq!(extract_json_object("no json here"), None);
    }
}
