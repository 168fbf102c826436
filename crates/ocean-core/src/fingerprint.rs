//! Stable serialization and content fingerprints
//!
//! [`stringify`] renders any JSON value with mapping keys sorted at every
//! level, so two structurally equal values always produce the same string
//! regardless of insertion order. [`fingerprint`] hashes that string with
//! BLAKE3 and renders it as grouped base-36.

use serde_json::{Map, Value};

use crate::id::to_base36;

/// Length of a fingerprint before grouping
pub const FINGERPRINT_LEN: usize = 26;

/// Characters per fingerprint group
const GROUP: usize = 4;

/// Serialize a value with recursively sorted keys
pub fn stringify(value: &Value) -> String {
    canonical(value).to_string()
}

/// Fingerprint of a value, grouped in blocks of four joined by `separator`
pub fn fingerprint(value: &Value, separator: &str) -> String {
    let digest = blake3::hash(stringify(value).as_bytes());
    let mut head = [0u8; 16];
    head.copy_from_slice(&digest.as_bytes()[..16]);

    let encoded = format!(
        "{:0>width$}",
        to_base36(u128::from_be_bytes(head)),
        width = FINGERPRINT_LEN
    );
    group(&encoded, separator)
}

fn group(encoded: &str, separator: &str) -> String {
    let chars: Vec<char> = encoded.chars().collect();
    chars
        .chunks(GROUP)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(separator)
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(values) => Value::Array(values.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
