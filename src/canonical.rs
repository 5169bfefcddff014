//! Canonical serialization for deterministic fingerprints.
//!
//! Snapshots and deltas are fingerprinted so audit records can prove which
//! graph state a comparison was computed against.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - No HashMap allowed: Use BTreeMap for maps in hashed data
//! - Ids are plain strings, so keys serialize identically everywhere

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// # Panics
///
/// Panics if `value` cannot be represented as JSON, for example a map with
/// non-string keys. Every type hashed by this crate has string keys.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_determinism() {
        let mut map = BTreeMap::new();
        map.insert("REQ-2", "second");
        map.insert("REQ-1", "first");

        assert_eq!(canonical_hash(&map), canonical_hash(&map.clone()));
        assert_eq!(canonical_hash_hex(&map).len(), 16);
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let mut a = BTreeMap::new();
        a.insert("x", 1);
        a.insert("y", 2);
        let mut b = BTreeMap::new();
        b.insert("y", 2);
        b.insert("x", 1);

        assert_eq!(canonical_hash_hex(&a), canonical_hash_hex(&b));
    }

    #[test]
    fn test_distinct_values_hash_differently() {
        let mut map = BTreeMap::new();
        map.insert("REQ-1", "first");
        assert_ne!(canonical_hash(&map), canonical_hash(&BTreeMap::<&str, &str>::new()));
        assert_eq!(to_canonical_bytes(&map), br#"{"REQ-1":"first"}"#.to_vec());
    }

    #[test]
    #[should_panic(expected = "canonical serialization failed")]
    fn test_unrepresentable_value_panics() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), "tuple keys are not JSON object keys");
        to_canonical_bytes(&map);
    }
}
