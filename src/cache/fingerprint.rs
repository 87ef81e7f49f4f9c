//! Fingerprint Module
//!
//! Derives stable cache keys for memoized calls.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

// == Call Arguments ==
/// Positional and keyword arguments of a memoized call.
///
/// Keyword arguments are kept sorted by name, so the order in which a call
/// site supplies them never changes the fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallArgs {
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Appends a positional argument of any serializable type.
    pub fn try_arg<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.args.push(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Sets a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Sets a keyword argument of any serializable type.
    pub fn try_kwarg<T: Serialize + ?Sized>(
        mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        self.kwargs.insert(name.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Value> {
        &self.kwargs
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

// == Fingerprint ==
/// Builds the logical cache key `"{prefix}:{function}:{sha256}"`.
///
/// The digest covers a canonical JSON encoding of
/// `[prefix, function, args, kwargs]` with object keys sorted at every depth,
/// so it is stable across runs and independent of map insertion order.
pub fn fingerprint(prefix: &str, function: &str, call: &CallArgs) -> String {
    let mut canonical = String::new();
    let kwargs: serde_json::Map<String, Value> = call
        .kwargs
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let document = Value::Array(vec![
        Value::from(prefix),
        Value::from(function),
        Value::Array(call.args.clone()),
        Value::Object(kwargs),
    ]);
    write_canonical(&document, &mut canonical);

    let digest = Sha256::digest(canonical.as_bytes());
    format!("{}:{}:{}", prefix, function, hex::encode(digest))
}

/// Writes `value` as compact JSON with sorted object keys.
///
/// `Value::to_string` only sorts while `serde_json::Map` is a `BTreeMap`.
/// Cargo feature unification turns it into an insertion-ordered map as soon
/// as any crate in the build enables `serde_json/preserve_order`, which
/// would silently change every fingerprint. Sorting here keeps keys stable
/// under either map.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
