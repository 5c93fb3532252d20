//! Deterministic report digests.
//!
//! `sp1_` || hex(SHA256(canonical JSON)), with object keys sorted
//! recursively and no insignificant whitespace.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::KernelError;

pub const DIGEST_PREFIX: &str = "sp1_";

fn sort_json_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(item) = map.get(key) {
                    sorted.insert(key.clone(), sort_json_value(item));
                }
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_json_value).collect()),
        _ => value.clone(),
    }
}

pub fn canonical_digest(value: &Value) -> Result<String, KernelError> {
    let rendered = serde_json::to_string(&sort_json_value(value))
        .map_err(|e| KernelError::Serialize(e.to_string()))?;
    let hash = Sha256::digest(rendered.as_bytes());
    Ok(format!("{DIGEST_PREFIX}{hash:x}"))
}

/// Digest of `report` as serialized with its `digest` field blanked.
pub fn report_digest<T: Serialize>(report: &T) -> Result<String, KernelError> {
    let mut value =
        serde_json::to_value(report).map_err(|e| KernelError::Serialize(e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.insert("digest".to_string(), Value::String(String::new()));
    }
    canonical_digest(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_digest() {
        let a = canonical_digest(&json!({"b": 1, "a": {"y": 2, "x": 3}})).unwrap();
        let b = canonical_digest(&json!({"a": {"x": 3, "y": 2}, "b": 1})).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(DIGEST_PREFIX));
        assert_eq!(a.len(), DIGEST_PREFIX.len() + 64);
    }

    #[test]
    fn existing_digest_field_is_ignored() {
        let a = report_digest(&json!({"score": 0.5, "digest": "stale"})).unwrap();
        let b = report_digest(&json!({"score": 0.5, "digest": ""})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, report_digest(&json!({"score": 0.6, "digest": ""})).unwrap());
    }
}
