use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::basic::error::ConfError;
use crate::basic::result::ConfResult;

/// Content type every config-center payload is exchanged with.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Json codec used for every payload on the wire.
///
/// # Examples
/// ```ignore
/// use confsource::basic::json::ConfJson;
/// let body = ConfJson.obj_to_string(&serde_json::json!({"timeout": "500"}))?;
/// let doc = ConfJson.str_to_obj::<std::collections::HashMap<String, String>>(&body)?;
/// assert_eq!(doc["timeout"], "500");
/// ```
pub struct ConfJson;

impl ConfJson {
    /// Decode a json string into a Rust object.
    pub fn str_to_obj<T: DeserializeOwned>(&self, str: &str) -> ConfResult<T> {
        serde_json::from_str::<T>(str).map_err(|error| ConfError::DecodeFailure(format!("[ConfSource.Json] {error}")))
    }

    /// Decode a raw body, refusing it when the declared content type is not `expected`.
    ///
    /// A missing content type is accepted.
    pub fn body_to_obj<T: DeserializeOwned>(&self, content_type: Option<&str>, expected: &str, body: &str) -> ConfResult<T> {
        if let Some(content_type) = content_type {
            if !content_type.is_empty() && !expected.is_empty() && !content_type.contains(expected) {
                return Err(ConfError::DecodeFailure(format!("[ConfSource.Json] content type not {expected}, got {content_type}")));
            }
        }
        self.str_to_obj(body)
    }

    pub fn obj_to_string<T: ?Sized + Serialize>(&self, obj: &T) -> ConfResult<String> {
        serde_json::to_string(obj).map_err(|error| ConfError::FormatError(format!("[ConfSource.Json] {error}")))
    }

    pub fn obj_to_json<T: Serialize>(&self, obj: &T) -> ConfResult<Value> {
        serde_json::to_value(obj).map_err(|error| ConfError::FormatError(format!("[ConfSource.Json] {error}")))
    }

    /// Render a config value as the plain text stored by text-only backends.
    ///
    /// Strings are kept as is, everything else is written as json.
    pub fn value_to_text(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::{ConfJson, JSON_CONTENT_TYPE};
    use crate::basic::error::ConfError;

    #[test]
    fn test_body_to_obj() {
        let doc: HashMap<String, String> = ConfJson.body_to_obj(Some("application/json;charset=UTF-8"), JSON_CONTENT_TYPE, r#"{"timeout":"500"}"#).unwrap();
        assert_eq!(doc["timeout"], "500");

        let doc: HashMap<String, String> = ConfJson.body_to_obj(None, JSON_CONTENT_TYPE, r#"{"timeout":"500"}"#).unwrap();
        assert_eq!(doc.len(), 1);

        let result = ConfJson.body_to_obj::<HashMap<String, String>>(Some("text/html"), JSON_CONTENT_TYPE, r#"{"timeout":"500"}"#);
        assert!(matches!(result, Err(ConfError::DecodeFailure(_))));

        let result = ConfJson.body_to_obj::<HashMap<String, String>>(None, JSON_CONTENT_TYPE, "<html/>");
        assert!(matches!(result, Err(ConfError::DecodeFailure(_))));
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(ConfJson.value_to_text(&json!("500")), "500");
        assert_eq!(ConfJson.value_to_text(&json!(500)), "500");
        assert_eq!(ConfJson.value_to_text(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
