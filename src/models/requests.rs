//! Request DTOs for the cache gateway API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed encoded value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value; a JSON string is stored as plain text
/// - `ttl`: Optional TTL in seconds (no expiry if not specified)
/// - `namespace`: Optional namespace overriding the server default
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(error) = validate_key(&self.key) {
            return Some(error);
        }
        if let Some(error) = self.namespace.as_deref().and_then(validate_namespace) {
            return Some(error);
        }
        if self.ttl == Some(0) {
            return Some("TTL must be at least 1 second".to_string());
        }
        let size = match &self.value {
            Value::String(text) => text.len(),
            other => other.to_string().len(),
        };
        if size > MAX_VALUE_SIZE {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            ));
        }
        None
    }
}

/// Request body for POST /expire/:key
#[derive(Debug, Clone, Deserialize)]
pub struct ExpireRequest {
    pub seconds: u64,
}

/// Query string accepted by the per-key endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    /// Namespace overriding the server default
    #[serde(default)]
    pub namespace: Option<String>,
    /// Return JSON entries as raw text instead of decoding them
    #[serde(default)]
    pub raw: bool,
}

/// Checks key length limits.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Namespaces must be non-empty and short.
pub fn validate_namespace(namespace: &str) -> Option<String> {
    if namespace.is_empty() {
        return Some("Namespace cannot be empty".to_string());
    }
    if namespace.len() > 64 {
        return Some("Namespace exceeds maximum length of 64 bytes".to_string());
    }
    None
}
