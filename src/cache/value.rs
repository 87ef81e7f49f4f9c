//! Cache Value Module
//!
//! The values the cache accepts and returns, and their tagged byte encoding.
//!
//! Every value written by this crate is prefixed with a two-byte tag so a
//! reader can tell an intentional string apart from JSON text:
//!
//! | tag  | payload                 |
//! |------|-------------------------|
//! | `s:` | UTF-8 text              |
//! | `b:` | opaque bytes            |
//! | `j:` | JSON document           |
//!
//! Untagged values (written by other clients) are decoded heuristically:
//! UTF-8 that parses as JSON becomes `Json` when decoding is requested,
//! other UTF-8 becomes `Text`, anything else `Bytes`.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

const TEXT_TAG: &[u8] = b"s:";
const BYTES_TAG: &[u8] = b"b:";
const JSON_TAG: &[u8] = b"j:";

// == Cache Value ==
/// A value stored in or returned by the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Plain text, stored as-is
    Text(String),
    /// Opaque bytes
    Bytes(Vec<u8>),
    /// A JSON document
    Json(Value),
}

impl CacheValue {
    /// Serializes any `Serialize` value into a JSON cache value.
    ///
    /// # Errors
    /// `CacheError::Serialization` if the value cannot be represented as JSON
    /// (for example a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Returns the text if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the JSON document if this is a `Json` value.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs and gateway responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "json",
        }
    }

    /// Converts to a JSON value: text becomes a JSON string, bytes hex.
    pub fn into_json(self) -> Value {
        match self {
            Self::Text(text) => Value::String(text),
            Self::Bytes(bytes) => Value::String(hex::encode(bytes)),
            Self::Json(value) => value,
        }
    }

    // == Encode ==
    /// Tagged byte representation written to the store.
    pub fn encode(&self) -> Vec<u8> {
        let (tag, payload): (&[u8], Vec<u8>) = match self {
            Self::Text(text) => (TEXT_TAG, text.as_bytes().to_vec()),
            Self::Bytes(bytes) => (BYTES_TAG, bytes.clone()),
            Self::Json(value) => (JSON_TAG, value.to_string().into_bytes()),
        };
        let mut out = Vec::with_capacity(tag.len() + payload.len());
        out.extend_from_slice(tag);
        out.extend_from_slice(&payload);
        out
    }

    // == Decode ==
    /// Decodes raw store bytes.
    ///
    /// With `json_decode` off, JSON entries come back as their raw text.
    /// Never fails; the returned flag is true when JSON decoding was
    /// attempted and fell back to raw text.
    pub fn decode(raw: Vec<u8>, json_decode: bool) -> (Self, bool) {
        if let Some(payload) = raw.strip_prefix(TEXT_TAG) {
            return (text_or_bytes(payload.to_vec()), false);
        }
        if let Some(payload) = raw.strip_prefix(BYTES_TAG) {
            return (Self::Bytes(payload.to_vec()), false);
        }
        if let Some(payload) = raw.strip_prefix(JSON_TAG) {
            return decode_json_text(payload.to_vec(), json_decode);
        }
        decode_json_text(raw, json_decode)
    }
}

fn text_or_bytes(raw: Vec<u8>) -> CacheValue {
    match String::from_utf8(raw) {
        Ok(text) => CacheValue::Text(text),
        Err(err) => CacheValue::Bytes(err.into_bytes()),
    }
}

fn decode_json_text(raw: Vec<u8>, json_decode: bool) -> (CacheValue, bool) {
    let text = match String::from_utf8(raw) {
        Ok(text) => text,
        Err(err) => return (CacheValue::Bytes(err.into_bytes()), false),
    };
    if !json_decode {
        return (CacheValue::Text(text), false);
    }
    match serde_json::from_str(&text) {
        Ok(value) => (CacheValue::Json(value), false),
        Err(_) => (CacheValue::Text(text), true),
    }
}

impl From<&str> for CacheValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for CacheValue {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<Value> for CacheValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}
