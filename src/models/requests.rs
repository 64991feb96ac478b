//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store (any JSON document)
/// - `ttl`: Optional TTL in seconds (uses the instance default if not
///   specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Request body for pattern invalidation (POST /invalidate-pattern)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidatePatternRequest {
    /// Regular expression matched against memory-resident keys
    pub pattern: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, Value::String("hello".to_string()));
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_structured_value() {
        let json = r#"{"key": "pkg", "value": {"version": "2.31.0"}, "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60));
        assert!(req.value.get("version").is_some());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: Value::Null,
            ttl: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        let req = SetRequest {
            key: "x".repeat(MAX_KEY_LENGTH + 1),
            value: Value::Null,
            ttl: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetRequest {
            key: "valid_key".to_string(),
            value: Value::Bool(true),
            ttl: Some(60),
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_invalidate_pattern_request_deserialize() {
        let json = r#"{"pattern": "^session_"}"#;
        let req: InvalidatePatternRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.pattern, "^session_");
    }
}
