//! Snapshot layout
//!
//! A store is persisted as flat JSON in one of two layouts:
//!
//! - Directory: `<dir>/<name>.items.json`, `<dir>/<name>.index.json` and
//!   `<dir>/<name>.links.json`
//! - Single file: one `{items, index, links, lastUpdate}` document at
//!   `<dir>/<name>`, where `name` must end in `.json`
//!
//! Memory stores have no layout and are never written.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::content::ContentStore;
use crate::error::{StoreError, StoreResult};
use crate::index::ValueIndex;
use crate::item::Item;
use crate::links::LinkIndex;

/// Persistence mode of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// One JSON document holding everything
    File,
    /// Three JSON documents in a directory
    #[default]
    Directory,
    /// Never persisted
    Memory,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::File => "file",
            StoreKind::Directory => "directory",
            StoreKind::Memory => "memory",
        })
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "directory" | "dir" => Ok(StoreKind::Directory),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!(
                "unknown store kind '{}' (expected file, directory or memory)",
                other
            )),
        }
    }
}

/// Resolved file locations for a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    File {
        file: PathBuf,
    },
    Directory {
        dir: PathBuf,
        items: PathBuf,
        index: PathBuf,
        links: PathBuf,
    },
    Memory,
}

impl Layout {
    /// Work out where a store named `name` lives
    ///
    /// Fails with `InvalidDestination` when a single-file store is not
    /// named `*.json`.
    pub fn resolve(kind: StoreKind, name: &str, path: Option<&Path>) -> StoreResult<Self> {
        let dir = path.map(Path::to_path_buf).unwrap_or_default();
        match kind {
            StoreKind::File => {
                let file = dir.join(name);
                if !has_json_extension(&file) {
                    return Err(StoreError::InvalidDestination(file));
                }
                Ok(Layout::File { file })
            }
            StoreKind::Directory => Ok(Layout::Directory {
                items: dir.join(format!("{}.items.json", name)),
                index: dir.join(format!("{}.index.json", name)),
                links: dir.join(format!("{}.links.json", name)),
                dir,
            }),
            StoreKind::Memory => Ok(Layout::Memory),
        }
    }

    /// Files this layout reads and writes
    pub fn files(&self) -> Vec<&Path> {
        match self {
            Layout::File { file } => vec![file.as_path()],
            Layout::Directory {
                items,
                index,
                links,
                ..
            } => vec![items.as_path(), index.as_path(), links.as_path()],
            Layout::Memory => Vec::new(),
        }
    }
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Everything a store persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub items: BTreeMap<String, Item>,
    #[serde(default)]
    pub index: ValueIndex,
    #[serde(default)]
    pub links: LinkIndex,
    #[serde(default, rename = "lastUpdate")]
    pub last_update: Option<DateTime<Utc>>,
}

/// Borrowed view of a store's state, for writing
#[derive(Debug, Serialize)]
pub struct SnapshotRef<'a> {
    pub items: &'a BTreeMap<String, Item>,
    pub index: &'a ValueIndex,
    pub links: &'a LinkIndex,
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<DateTime<Utc>>,
}

/// Load a snapshot; missing files yield empty collections
pub fn load(content: &dyn ContentStore, layout: &Layout) -> StoreResult<Snapshot> {
    let mut snapshot = match layout {
        Layout::Memory => Snapshot::default(),
        Layout::File { file } => {
            if content.exists(file) {
                serde_json::from_value(content.read_json(file)?)?
            } else {
                Snapshot::default()
            }
        }
        Layout::Directory {
            dir,
            items,
            index,
            links,
        } => {
            content.make_dir(dir)?;
            Snapshot {
                items: read_or_default(content, items)?,
                index: read_or_default(content, index)?,
                links: read_or_default(content, links)?,
                last_update: None,
            }
        }
    };

    snapshot.items = rekey(std::mem::take(&mut snapshot.items));
    debug!(
        "Loaded {} items, {} index values, {} link entries",
        snapshot.items.len(),
        snapshot.index.len(),
        snapshot.links.len()
    );
    Ok(snapshot)
}

/// Write a snapshot in the layout's shape
///
/// A single-file snapshot first removes the previous file. Memory layouts
/// write nothing.
pub fn save(
    content: &dyn ContentStore,
    layout: &Layout,
    snapshot: SnapshotRef<'_>,
) -> StoreResult<()> {
    match layout {
        Layout::Memory => Ok(()),
        Layout::File { file } => {
            if !has_json_extension(file) {
                return Err(StoreError::InvalidDestination(file.clone()));
            }
            let value = serde_json::to_value(&snapshot)?;
            content.remove(file)?;
            content.write_json(file, &value)?;
            Ok(())
        }
        Layout::Directory {
            dir,
            items,
            index,
            links,
        } => {
            content.make_dir(dir)?;
            content.write_json(items, &serde_json::to_value(snapshot.items)?)?;
            content.write_json(index, &serde_json::to_value(snapshot.index)?)?;
            content.write_json(links, &serde_json::to_value(snapshot.links)?)?;
            Ok(())
        }
    }
}

fn read_or_default<T>(content: &dyn ContentStore, path: &Path) -> StoreResult<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    if !content.exists(path) {
        return Ok(T::default());
    }
    match content.read_json(path)? {
        Value::Null => Ok(T::default()),
        value => Ok(serde_json::from_value(value)?),
    }
}

/// Key every item by its own id
fn rekey(items: BTreeMap<String, Item>) -> BTreeMap<String, Item> {
    items
        .into_iter()
        .map(|(key, item)| {
            if key != item.id() {
                warn!(
                    "Item stored under '{}' has id '{}'; keeping it under its id",
                    key,
                    item.id()
                );
            }
            (item.id().to_string(), item)
        })
        .collect()
}
