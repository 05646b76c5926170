//! Canonical schema serialisation and the compile-cache key derived from it.
//!
//! Objects are written with keys in lexicographic order, arrays keep their
//! order and scalars use their standard JSON literal form, so two schemas
//! that differ only in mapping key order hash identically.
use serde_json::Value;
use sha2::{Digest, Sha256};

pub(crate) type CacheKey = [u8; 32];

/// SHA-256 over the canonical serialisation of `value`.
pub(crate) fn digest(value: &Value) -> CacheKey {
    let mut serialized = String::new();
    write_canonical(value, &mut serialized);
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let mut key = CacheKey::default();
    key.copy_from_slice(&hasher.finalize());
    key
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(text) => {
            out.push_str(&Value::String(text.clone()).to_string());
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(object) => {
            let mut keys: Vec<&String> = object.keys().collect();
            keys.sort_unstable();
            out.push('{');
            for (index, key) in keys.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&object[*key], out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let first = json!({"b": 1, "a": {"y": true, "x": [1, 2]}});
        let second = json!({"a": {"x": [1, 2], "y": true}, "b": 1});
        assert_eq!(digest(&first), digest(&second));
    }

    #[test]
    fn array_order_matters() {
        assert_ne!(digest(&json!([1, 2])), digest(&json!([2, 1])));
    }

    #[test]
    fn scalars_disambiguate() {
        assert_ne!(digest(&json!("1")), digest(&json!(1)));
        assert_ne!(digest(&json!(null)), digest(&json!(false)));
    }
}
