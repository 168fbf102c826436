//! Items
//!
//! An item is a schema-less record: an identity (`id`, `model`, optional
//! `hash`) kept apart from a mapping of nested properties. Properties are
//! read and written through [`Path`]s:
//!
//! ```text
//! item.set("a.b.*.c", json!("v"))?;   // {"a": {"b": [{"c": "v"}]}}
//! item.set("names.short.*", json!("Ocean"))?;
//! item.get("a.b.0.c")?;               // Some("v")
//! ```
//!
//! Items are created by the [`Store`](crate::store::Store), which owns them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::fingerprint;
use crate::path::{Path, Segment};

/// Well-known model tags
pub mod models {
    /// Default tag; items with it are not indexed by model
    pub const GENERIC: &str = "Item";
    pub const IDENTITY: &str = "Identity";
    pub const REFERENCE: &str = "Reference";
    pub const ASSET: &str = "Asset";
}

/// A record with identity and nested properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

fn default_model() -> String {
    models::GENERIC.to_string()
}

impl Item {
    /// Create an empty item
    ///
    /// `model` falls back to the generic tag.
    pub fn new(id: impl Into<String>, model: Option<&str>) -> Self {
        Self {
            id: id.into(),
            model: model.unwrap_or(models::GENERIC).to_string(),
            hash: None,
            properties: Map::new(),
        }
    }

    /// Rebuild an item from its serialized form
    pub fn from_value(value: Value) -> StoreResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialized form of the item
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Last computed fingerprint, if any
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Whether the item carries a non-generic model tag
    pub fn has_model(&self) -> bool {
        self.model != models::GENERIC
    }

    /// Replace the model tag. The store re-indexes after calling this.
    pub(crate) fn set_model(&mut self, model: Option<&str>) {
        self.model = model.unwrap_or(models::GENERIC).to_string();
    }

    /// Write `value` at `path`
    ///
    /// Literal keys overwrite. A final `*` appends to a sequence unless an
    /// equal value is already there; either way the position is returned.
    /// Intermediate keys are created as sequences when the next segment is
    /// `*` and as mappings otherwise. A `null` value leaves the item
    /// untouched.
    pub fn set(&mut self, path: impl Into<Path>, value: Value) -> StoreResult<Option<usize>> {
        if value.is_null() {
            return Ok(None);
        }
        let path = path.into();
        if path.is_empty() {
            return Err(StoreError::EmptyPath);
        }
        set_in_map(&mut self.properties, path.segments(), value)
    }

    /// Read the value at `path`
    ///
    /// Numeric keys address sequence positions. Returns `None` when any
    /// step is missing.
    pub fn get(&self, path: impl Into<Path>) -> StoreResult<Option<&Value>> {
        let path = path.into();
        let (first, rest) = path.segments().split_first().ok_or(StoreError::EmptyPath)?;

        let mut current = match first {
            Segment::Key(key) => self.properties.get(key),
            Segment::Append => None,
        };
        for segment in rest {
            current = current.and_then(|value| child(value, segment));
        }
        Ok(current)
    }

    /// Remove and return the value at `path`
    pub fn unset(&mut self, path: impl Into<Path>) -> StoreResult<Option<Value>> {
        let path = path.into();
        let (last, parents) = path.segments().split_last().ok_or(StoreError::EmptyPath)?;

        if parents.is_empty() {
            return Ok(match last {
                Segment::Key(key) => self.properties.remove(key),
                Segment::Append => None,
            });
        }

        let (first, middle) = parents.split_first().ok_or(StoreError::EmptyPath)?;
        let mut current = match first {
            Segment::Key(key) => self.properties.get_mut(key),
            Segment::Append => None,
        };
        for segment in middle {
            current = current.and_then(|value| child_mut(value, segment));
        }

        Ok(match (current, last) {
            (Some(Value::Object(map)), Segment::Key(key)) => map.remove(key),
            (Some(Value::Array(values)), segment) => match segment.position() {
                Some(pos) if pos < values.len() => Some(values.remove(pos)),
                _ => None,
            },
            _ => None,
        })
    }

    /// Replace every top-level property with `f(value)`
    ///
    /// Nested containers are passed whole. A `null` result keeps the old
    /// value.
    pub fn map(&mut self, mut f: impl FnMut(&Value) -> Value) {
        for value in self.properties.values_mut() {
            let mapped = f(value);
            if !mapped.is_null() {
                *value = mapped;
            }
        }
    }

    /// Write every property of `other`, each key read as a dotted path
    ///
    /// Later values win and containers are replaced, not deep-merged.
    pub fn merge(&mut self, other: &Map<String, Value>) -> StoreResult<()> {
        for (key, value) in other {
            self.set(Path::parse(key), value.clone())?;
        }
        Ok(())
    }

    /// Compute and store a fingerprint of the item
    ///
    /// Covers the id, model and properties; a previous fingerprint does not
    /// feed into the next one.
    pub fn compute_hash(&mut self, separator: &str) -> &str {
        let content = json!({
            "id": self.id,
            "model": self.model,
            "properties": self.properties,
        });
        self.hash.insert(fingerprint::fingerprint(&content, separator))
    }
}

fn set_in_map(
    map: &mut Map<String, Value>,
    segments: &[Segment],
    value: Value,
) -> StoreResult<Option<usize>> {
    let key = match &segments[0] {
        Segment::Key(key) => key,
        Segment::Append => return Err(mismatch(&segments[0], "a mapping")),
    };

    if segments.len() == 1 {
        map.insert(key.clone(), value);
        return Ok(None);
    }

    let slot = map.entry(key.clone()).or_insert(Value::Null);
    descend(slot, &segments[1..], value)
}

fn set_in_array(
    values: &mut Vec<Value>,
    segments: &[Segment],
    value: Value,
) -> StoreResult<Option<usize>> {
    match &segments[0] {
        Segment::Append if segments.len() == 1 => Ok(Some(push_unique(values, value))),
        Segment::Append => {
            values.push(empty_container(segments[1].is_append()));
            let last = values.len() - 1;
            set_in_value(&mut values[last], &segments[1..], value)
        }
        segment => match segment.position().filter(|pos| *pos < values.len()) {
            Some(pos) if segments.len() == 1 => {
                values[pos] = value;
                Ok(None)
            }
            Some(pos) => descend(&mut values[pos], &segments[1..], value),
            None => Err(mismatch(segment, "a sequence")),
        },
    }
}

/// Make sure `slot` holds a container for `rest`, then write into it
fn descend(slot: &mut Value, rest: &[Segment], value: Value) -> StoreResult<Option<usize>> {
    if is_falsy(slot) {
        *slot = empty_container(rest[0].is_append());
    }
    set_in_value(slot, rest, value)
}

fn set_in_value(
    target: &mut Value,
    segments: &[Segment],
    value: Value,
) -> StoreResult<Option<usize>> {
    match target {
        Value::Object(map) => set_in_map(map, segments, value),
        Value::Array(values) => set_in_array(values, segments, value),
        other => Err(mismatch(&segments[0], kind_of(other))),
    }
}

fn child<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key),
        (Value::Array(values), segment) => segment.position().and_then(|pos| values.get(pos)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match (value, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get_mut(key),
        (Value::Array(values), segment) => {
            segment.position().and_then(move |pos| values.get_mut(pos))
        }
        _ => None,
    }
}

/// Append `value` unless an equal element exists; returns its position
pub(crate) fn push_unique(values: &mut Vec<Value>, value: Value) -> usize {
    if let Some(pos) = values.iter().position(|v| *v == value) {
        return pos;
    }
    values.push(value);
    values.len() - 1
}

fn empty_container(sequence: bool) -> Value {
    if sequence {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn mismatch(segment: &Segment, found: &str) -> StoreError {
    StoreError::ContainerMismatch {
        segment: segment.to_string(),
        found: found.to_string(),
    }
}
