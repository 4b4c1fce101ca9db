//! Call fingerprints.
//!
//! A fingerprint is a SHA-256 digest over the operation name and a
//! canonical serialization of the input, where object keys are emitted in
//! sorted order at every depth. Two requests share a fingerprint exactly
//! when they name the same operation with structurally equal input.

use std::fmt::{self, Write as _};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::ports::ServiceRequest;

/// Fixed-width cache key identifying one outgoing call.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a request.
    pub fn of(request: &ServiceRequest) -> Self {
        Self::from_parts(&request.operation, &request.input)
    }

    /// Fingerprint an operation name and input payload.
    pub fn from_parts(operation: &str, input: &Value) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(operation.as_bytes());
        // separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update([0u8]);
        hasher.update(canonical_json(input).as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering (64 characters).
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

/// Serialize a JSON value with object keys sorted at every depth.
///
/// `serde_json::to_string` only sorts keys while its `preserve_order`
/// feature is off, and any crate in the dependency graph can turn it on, so
/// the ordering is done here explicitly.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
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

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_change_fingerprint() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":[1,2],"x":null}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":{"x":null,"y":[1,2]},"b":1}"#).unwrap();
        assert_eq!(
            Fingerprint::from_parts("DescribeVolumes", &a),
            Fingerprint::from_parts("DescribeVolumes", &b)
        );
    }

    #[test]
    fn test_operation_distinguishes_equal_input() {
        let input = json!({"MaxResults": 50});
        assert_ne!(
            Fingerprint::from_parts("ListBuckets", &input),
            Fingerprint::from_parts("ListUsers", &input)
        );
    }

    #[test]
    fn test_array_order_is_significant() {
        assert_ne!(
            Fingerprint::from_parts("op", &json!([1, 2])),
            Fingerprint::from_parts("op", &json!([2, 1]))
        );
    }

    #[test]
    fn test_operation_input_boundary() {
        assert_ne!(
            Fingerprint::from_parts("ab", &json!("c")),
            Fingerprint::from_parts("a", &json!("bc"))
        );
    }

    #[test]
    fn test_hex_is_64_lowercase_chars() {
        let hex = Fingerprint::from_parts("op", &Value::Null).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = json!({"z": {"b": true, "a": "s"}, "m": [ {"d": 1, "c": 2} ]});
        assert_eq!(
            canonical_json(&value),
            r#"{"m":[{"c":2,"d":1}],"z":{"a":"s","b":true}}"#
        );
    }

    #[test]
    fn test_canonical_json_ignores_insertion_order() {
        let mut map = serde_json::Map::new();
        map.insert("zone".to_string(), json!("us-east-1a"));
        map.insert("account".to_string(), json!("123456789012"));
        assert_eq!(
            canonical_json(&Value::Object(map)),
            r#"{"account":"123456789012","zone":"us-east-1a"}"#
        );
    }

    proptest! {
        #[test]
        fn prop_distinct_operations_distinct_fingerprints(
            op_a in "[A-Za-z]{1,16}",
            op_b in "[A-Za-z]{1,16}",
            n in any::<i64>(),
        ) {
            prop_assume!(op_a != op_b);
            let input = json!({"n": n});
            prop_assert_ne!(
                Fingerprint::from_parts(&op_a, &input),
                Fingerprint::from_parts(&op_b, &input)
            );
        }

        #[test]
        fn prop_fingerprint_is_deterministic(op in "[A-Za-z]{1,16}", s in ".*") {
            let input = json!({"value": s});
            prop_assert_eq!(
                Fingerprint::from_parts(&op, &input),
                Fingerprint::from_parts(&op, &input.clone())
            );
        }
    }
}
