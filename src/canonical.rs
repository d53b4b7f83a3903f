//! Canonical encoding and hashing of structured records.
//!
//! Object keys are written in lexicographic order at every depth so that two
//! records with the same logical content always produce the same digest.
//! Arrays keep their order: the position of a transaction inside a block is
//! part of the block's identity.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compact JSON text with sorted object keys.
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Hex SHA-256 digest of the canonical encoding of `fields`.
pub fn hash(fields: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encode(fields).as_bytes());
    hex::encode(hasher.finalize())
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            // Map iteration order is only sorted while serde_json's
            // `preserve_order` feature is off, and any crate in the build can
            // turn it on. Sort explicitly.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Display on a string Value yields the escaped, quoted literal.
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_value(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{encode, hash};
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let a = json!({"recipient": "bob", "amount": 10, "sender": null});
        let b = json!({"sender": null, "amount": 10, "recipient": "bob"});
        assert_eq!(hash(&a), hash(&b));
        assert_eq!(encode(&a), r#"{"amount":10,"recipient":"bob","sender":null}"#);
    }

    #[test]
    fn nested_objects_are_sorted_but_arrays_are_not() {
        let v = json!({"z": [{"b": 1, "a": 2}, 3], "a": "x"});
        assert_eq!(encode(&v), r#"{"a":"x","z":[{"a":2,"b":1},3]}"#);

        let forward = json!({"items": [1, 2]});
        let reversed = json!({"items": [2, 1]});
        assert_ne!(hash(&forward), hash(&reversed));
    }

    #[test]
    fn digest_is_hex_sha256() {
        let h = hash(&json!({}));
        assert_eq!(h.len(), 64);
        // sha256("{}")
        assert_eq!(
            h,
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn strings_are_escaped() {
        let v = json!({"k\"ey": "line\nbreak"});
        assert_eq!(encode(&v), r#"{"k\"ey":"line\nbreak"}"#);
    }
}
