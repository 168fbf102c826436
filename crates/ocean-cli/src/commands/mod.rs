//! Command handlers

pub mod config;
pub mod index;
pub mod item;
pub mod link;
pub mod model;
pub mod status;

use serde_json::Value;

/// Read a command-line value as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
