//! Unified storage interface
//!
//! The `Store` owns every item and the two structures derived from them:
//! - a value index (value → item ids)
//! - a link index (item id → incoming/outgoing ids)
//!
//! All mutation goes through the store so the `last_update` marker and the
//! indexes stay consistent. Items never refer back to the store.
//!
//! ## Usage
//!
//! ```text
//! let mut store = Store::memory();
//!
//! let id = store.identity(Some("Ocean"), None, None)?;
//! assert_eq!(store.from_index("Ocean", Some(models::IDENTITY), None)?, vec![id]);
//!
//! let asset = store.fetch("dup-key", models::ASSET)?;  // get or create
//! store.add_link(&asset, &id, None, Some("role"), Some(json!("author")))?;
//! store.save()?;
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_LINK_PROPERTY;
use crate::error::{StoreError, StoreResult};
use crate::id::IdGenerator;
use crate::index::ValueIndex;
use crate::item::{models, Item};
use crate::links::LinkIndex;
use crate::path::{Path, Segment};
use crate::storage::{
    snapshot, ContentStore, FsContentStore, Layout, SnapshotRef, StoreKind,
};

/// Default name type for identities
pub const DEFAULT_NAME_TYPE: &str = "short";

/// Default title type for assets
pub const DEFAULT_TITLE_TYPE: &str = "original";

/// How and where a store is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub kind: StoreKind,
    /// Store name; the file name in single-file mode
    pub name: String,
    /// Directory holding the snapshot files
    pub path: Option<PathBuf>,
    /// Property that holds link annotations on source items
    pub link_property: String,
}

impl StoreOptions {
    /// A store that is never persisted
    pub fn memory() -> Self {
        Self {
            kind: StoreKind::Memory,
            name: "ocean".to_string(),
            path: None,
            link_property: DEFAULT_LINK_PROPERTY.to_string(),
        }
    }

    /// Three snapshot files named after `name` inside `path`
    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: StoreKind::Directory,
            name: name.into(),
            path: Some(path.into()),
            ..Self::memory()
        }
    }

    /// One snapshot file `name` inside `path`
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: StoreKind::File,
            name: name.into(),
            path: Some(path.into()),
            ..Self::memory()
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::memory()
    }
}

/// Summary counts for a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub items: usize,
    pub index_values: usize,
    pub link_entries: usize,
    pub last_update: Option<DateTime<Utc>>,
}

/// In-memory document store with optional snapshot persistence
pub struct Store {
    options: StoreOptions,
    layout: Layout,
    content: Box<dyn ContentStore>,
    items: BTreeMap<String, Item>,
    index: ValueIndex,
    links: LinkIndex,
    last_update: Option<DateTime<Utc>>,
}

impl Store {
    /// Open a store backed by the filesystem
    pub fn open(options: StoreOptions) -> StoreResult<Self> {
        Self::init(options, Box::new(FsContentStore::new()))
    }

    /// A fresh memory-only store
    pub fn memory() -> Self {
        Self {
            options: StoreOptions::memory(),
            layout: Layout::Memory,
            content: Box::new(FsContentStore::new()),
            items: BTreeMap::new(),
            index: ValueIndex::new(),
            links: LinkIndex::new(),
            last_update: None,
        }
    }

    /// Open a store through a specific content store
    ///
    /// Existing snapshot files are loaded; missing ones start empty.
    /// Memory stores never touch `content`.
    pub fn init(options: StoreOptions, content: Box<dyn ContentStore>) -> StoreResult<Self> {
        let layout = Layout::resolve(options.kind, &options.name, options.path.as_deref())?;
        let snapshot = snapshot::load(content.as_ref(), &layout)?;

        info!(
            "Opened {} store '{}' with {} items",
            options.kind,
            options.name,
            snapshot.items.len()
        );

        Ok(Self {
            options,
            layout,
            content,
            items: snapshot.items,
            index: snapshot.index,
            links: snapshot.links,
            last_update: snapshot.last_update,
        })
    }

    /// Write the current state back in the layout it was opened with
    ///
    /// Dangling index and link references are pruned first.
    pub fn save(&mut self) -> StoreResult<()> {
        let pruned = self.prune_dangling();
        if pruned > 0 {
            warn!("Pruned {} dangling references before saving", pruned);
        }

        snapshot::save(
            self.content.as_ref(),
            &self.layout,
            SnapshotRef {
                items: &self.items,
                index: &self.index,
                links: &self.links,
                last_update: self.last_update,
            },
        )?;

        if self.layout != Layout::Memory {
            info!(
                "Saved store '{}' ({} items)",
                self.options.name,
                self.items.len()
            );
        }
        Ok(())
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // ==================== Items ====================

    /// Insert or replace an item
    pub fn push(&mut self, item: Item) -> StoreResult<()> {
        if item.id().is_empty() {
            return Err(StoreError::MissingId);
        }
        self.items.insert(item.id().to_string(), item);
        self.touch();
        Ok(())
    }

    /// Return the item for `id` if it exists, otherwise create it
    ///
    /// Without an id a timestamp id is generated. Either way the item gets
    /// `model` and is indexed under it.
    pub fn new_item(&mut self, model: &str, id: Option<&str>) -> StoreResult<String> {
        let id = match id {
            Some(id) if self.items.contains_key(id) => id.to_string(),
            Some(id) => {
                self.push(Item::new(id, None))?;
                id.to_string()
            }
            None => {
                let id = IdGenerator::next();
                self.push(Item::new(id.as_str(), None))?;
                id
            }
        };
        self.set_model(&id, Some(model))?;
        Ok(id)
    }

    /// Generate a random id not used by any item
    pub fn random_id(&self, length: usize, blocksize: usize, prefix: &str) -> String {
        IdGenerator::random(length, blocksize, prefix, |id| self.items.contains_key(id))
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Read a property of an item
    pub fn get_path(&self, id: &str, path: impl Into<Path>) -> StoreResult<Option<&Value>> {
        self.item(id)?.get(path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Items in id order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Ids of the items carrying `model`, in id order
    pub fn items_of_model(&self, model: &str) -> Vec<String> {
        self.items
            .values()
            .filter(|item| item.model() == model)
            .map(|item| item.id().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Write a property of an item (see [`Item::set`])
    pub fn set(
        &mut self,
        id: &str,
        path: impl Into<Path>,
        value: Value,
    ) -> StoreResult<Option<usize>> {
        let position = self.item_mut(id)?.set(path, value)?;
        self.touch();
        Ok(position)
    }

    /// Remove a property of an item
    pub fn unset(&mut self, id: &str, path: impl Into<Path>) -> StoreResult<Option<Value>> {
        let removed = self.item_mut(id)?.unset(path)?;
        self.touch();
        Ok(removed)
    }

    /// Merge properties into an item (see [`Item::merge`])
    pub fn merge(&mut self, id: &str, other: &Map<String, Value>) -> StoreResult<()> {
        self.item_mut(id)?.merge(other)?;
        self.touch();
        Ok(())
    }

    /// Map the top-level properties of an item (see [`Item::map`])
    pub fn map_item(&mut self, id: &str, f: impl FnMut(&Value) -> Value) -> StoreResult<()> {
        self.item_mut(id)?.map(f);
        self.touch();
        Ok(())
    }

    /// Compute and store the fingerprint of an item
    pub fn hash(&mut self, id: &str, separator: &str) -> StoreResult<String> {
        let hash = self.item_mut(id)?.compute_hash(separator).to_string();
        self.touch();
        Ok(hash)
    }

    /// Change the model of an item
    ///
    /// `None` restores the generic tag. Non-generic models are indexed
    /// under their name and the previous model's entry is dropped.
    pub fn set_model(&mut self, id: &str, model: Option<&str>) -> StoreResult<()> {
        let item = self.item_mut(id)?;
        let previous = item.has_model().then(|| item.model().to_string());
        item.set_model(model);
        let current = item.has_model().then(|| item.model().to_string());

        if previous != current {
            if let Some(previous) = previous {
                self.index.remove(&previous, id);
            }
        }
        if let Some(current) = current {
            self.index.insert(&current, id);
        }
        self.touch();
        Ok(())
    }

    /// Append a name to `names.<nametype>` and index it
    pub fn set_name(&mut self, id: &str, name: &str, nametype: Option<&str>) -> StoreResult<()> {
        let nametype = nametype.unwrap_or(DEFAULT_NAME_TYPE);
        self.set(id, ["names", nametype, "*"], Value::from(name))?;
        self.index_registered(name, id)
    }

    /// Append a title to `titles.<titletype>` and index it
    pub fn set_title(&mut self, id: &str, title: &str, titletype: Option<&str>) -> StoreResult<()> {
        let titletype = titletype.unwrap_or(DEFAULT_TITLE_TYPE);
        self.set(id, ["titles", titletype, "*"], Value::from(title))?;
        self.index_registered(title, id)
    }

    /// Delete an item together with every index entry, adjacency entry and
    /// link annotation that refers to it
    pub fn remove(&mut self, id: &str) -> StoreResult<Item> {
        let item = self
            .items
            .remove(id)
            .ok_or_else(|| StoreError::UnknownItem(id.to_string()))?;

        let index_refs = self.index.retain_ids(|other| other != id);
        let link_refs = self.links.retain_ids(|other| other != id);

        let annotation = self.annotation_path(id);
        let mut annotations = 0;
        for other in self.items.values_mut() {
            if other.unset(annotation.clone())?.is_some() {
                annotations += 1;
            }
        }

        debug!(
            "Removed {} ({} index entries, {} link references, {} annotations)",
            id, index_refs, link_refs, annotations
        );
        self.touch();
        Ok(item)
    }

    // ==================== Value index ====================

    /// Index an item under `value`
    ///
    /// Returns false when the item was already indexed there.
    pub fn index(&mut self, value: &str, id: &str) -> StoreResult<bool> {
        self.item(id)?;
        let added = self.index.insert(value, id);
        if added {
            debug!("Indexed {} under '{}'", id, value);
            self.touch();
        }
        Ok(added)
    }

    /// Ids indexed under `value`, optionally restricted to `model`
    ///
    /// Fails with `TooManyMatches` when more than `max` ids match.
    pub fn from_index(
        &self,
        value: &str,
        model: Option<&str>,
        max: Option<usize>,
    ) -> StoreResult<Vec<String>> {
        let results: Vec<String> = self
            .index
            .get(value)
            .iter()
            .filter(|id| match model {
                Some(model) => self.items.get(id.as_str()).map(Item::model) == Some(model),
                None => true,
            })
            .cloned()
            .collect();

        match max {
            Some(max) if results.len() > max => Err(StoreError::TooManyMatches {
                value: value.to_string(),
                max,
                found: results,
            }),
            _ => Ok(results),
        }
    }

    /// The single id indexed under `value`, if any
    ///
    /// Fails with `AmbiguousMatch` when several ids match.
    pub fn get_unique(&self, value: &str, model: Option<&str>) -> StoreResult<Option<String>> {
        let mut matches = self.from_index(value, model, None)?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(StoreError::AmbiguousMatch {
                value: value.to_string(),
                matches,
            }),
        }
    }

    /// Get or create the item of `model` indexed under `value`
    ///
    /// Several matches are reported as a warning and the first one wins.
    pub fn fetch(&mut self, value: &str, model: &str) -> StoreResult<String> {
        let matches = self.from_index(value, Some(model), None)?;
        match matches.as_slice() {
            [] => {
                let id = self.new_item(model, None)?;
                self.index(value, &id)?;
                Ok(id)
            }
            [only] => Ok(only.clone()),
            [first, ..] => {
                warn!(
                    "{} {} items are indexed under '{}' ({}); using {}. Run a deduplication pass.",
                    matches.len(),
                    model,
                    value,
                    matches.join(", "),
                    first
                );
                Ok(first.clone())
            }
        }
    }

    pub fn value_index(&self) -> &ValueIndex {
        &self.index
    }

    // ==================== Links ====================

    /// Link `source` to `target`
    ///
    /// Writes an annotation on the source under `<link>.<target>`, where
    /// `<link>` is the configured link property, and records the link in
    /// the link index. A `name` becomes a key inside that annotation and a
    /// sub-path goes below it: `<link>.<target>.<name>.<path>` receives
    /// `value` (or `true`). Without a sub-path the annotation receives
    /// `value`, or an empty mapping if it has none yet. A null value is
    /// treated as no value.
    pub fn add_link(
        &mut self,
        source: &str,
        target: &str,
        name: Option<&str>,
        path: Option<&str>,
        value: Option<Value>,
    ) -> StoreResult<()> {
        self.item(target)?;
        let value = value.filter(|value| !value.is_null());
        let mut annotation = self.annotation_path(target);
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            annotation = annotation.join(Segment::key(name));
        }

        match path {
            Some(sub) if !sub.is_empty() => {
                for segment in Path::parse(sub).segments() {
                    annotation = annotation.join(segment.clone());
                }
                self.set(source, annotation, value.unwrap_or(Value::Bool(true)))?;
            }
            _ => match value {
                Some(value) => {
                    self.set(source, annotation, value)?;
                }
                None => {
                    if self.get_path(source, annotation.clone())?.is_none() {
                        self.set(source, annotation, Value::Object(Map::new()))?;
                    }
                }
            },
        }

        self.index_link(source, target)?;
        Ok(())
    }

    /// Remove the link `source → target` together with its annotation
    ///
    /// Returns false when the two items were not linked.
    pub fn unlink(&mut self, source: &str, target: &str) -> StoreResult<bool> {
        self.item(target)?;
        let annotation = self.annotation_path(target);
        let had_annotation = self.item_mut(source)?.unset(annotation)?.is_some();
        let had_link = self.links.remove(source, target);

        let removed = had_annotation || had_link;
        if removed {
            debug!("Unlinked {} -> {}", source, target);
            self.touch();
        }
        Ok(removed)
    }

    /// Record `source → target` in the link index
    pub fn index_link(&mut self, source: &str, target: &str) -> StoreResult<bool> {
        self.item(source)?;
        self.item(target)?;
        let added = self.links.insert(source, target);
        if added {
            debug!("Linked {} -> {}", source, target);
            self.touch();
        }
        Ok(added)
    }

    /// Rebuild the link index from the items' link annotations
    ///
    /// Every key of an item's link property names a target. Targets that
    /// do not exist are skipped. Returns the number of links indexed.
    pub fn rebuild_links(&mut self) -> usize {
        let previous = std::mem::take(&mut self.links);
        let property = self.options.link_property.as_str();

        for item in self.items.values() {
            let Some(Value::Object(targets)) = item.properties().get(property) else {
                continue;
            };
            for target in targets.keys() {
                if self.items.contains_key(target) {
                    self.links.insert(item.id(), target);
                } else {
                    warn!(
                        "Item {} links to missing item {}; skipping",
                        item.id(),
                        target
                    );
                }
            }
        }

        let count = self.links.pairs().count();
        if self.links != previous {
            info!("Rebuilt link index: {} links", count);
            self.touch();
        }
        count
    }

    /// Remove index and link references to items that do not exist
    pub fn prune_dangling(&mut self) -> usize {
        let items = &self.items;
        let pruned =
            self.index.retain_ids(|id| items.contains_key(id))
                + self.links.retain_ids(|id| items.contains_key(id));
        if pruned > 0 {
            self.touch();
        }
        pruned
    }

    pub fn link_index(&self) -> &LinkIndex {
        &self.links
    }

    /// Ids `id` links to
    pub fn outgoing(&self, id: &str) -> &[String] {
        self.links.outgoing(id)
    }

    /// Ids linking to `id`
    pub fn incoming(&self, id: &str) -> &[String] {
        self.links.incoming(id)
    }

    // ==================== Model constructors ====================

    /// Create a Reference for `namespace:code`
    ///
    /// The key indexes the reference and, when given, the target, which is
    /// also appended to `targets` and linked from the reference.
    pub fn reference(
        &mut self,
        namespace: &str,
        code: &str,
        target: Option<&str>,
    ) -> StoreResult<String> {
        if let Some(target) = target {
            self.item(target)?;
        }

        let id = self.new_item(models::REFERENCE, None)?;
        self.set(&id, "namespace", Value::from(namespace))?;
        self.set(&id, "code", Value::from(code))?;

        let key = format!("{}:{}", namespace, code);
        self.index(&key, &id)?;

        if let Some(target) = target {
            self.set(&id, "targets.*", Value::from(target))?;
            self.index(&key, target)?;
            self.add_link(&id, target, None, None, None)?;
        }
        Ok(id)
    }

    /// Create (or reuse, by id) an Identity, optionally named
    pub fn identity(
        &mut self,
        name: Option<&str>,
        nametype: Option<&str>,
        id: Option<&str>,
    ) -> StoreResult<String> {
        let id = self.new_item(models::IDENTITY, id)?;
        if let Some(name) = name {
            self.set_name(&id, name, nametype)?;
        }
        Ok(id)
    }

    /// Create (or reuse, by id) an Asset, optionally titled
    pub fn asset(
        &mut self,
        title: Option<&str>,
        titletype: Option<&str>,
        id: Option<&str>,
    ) -> StoreResult<String> {
        let id = self.new_item(models::ASSET, id)?;
        if let Some(title) = title {
            self.set_title(&id, title, titletype)?;
        }
        Ok(id)
    }

    // ==================== Status ====================

    /// Time of the last mutation, if any
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            items: self.items.len(),
            index_values: self.index.len(),
            link_entries: self.links.len(),
            last_update: self.last_update,
        }
    }

    // ==================== Internals ====================

    fn item(&self, id: &str) -> StoreResult<&Item> {
        self.items
            .get(id)
            .ok_or_else(|| StoreError::UnknownItem(id.to_string()))
    }

    fn item_mut(&mut self, id: &str) -> StoreResult<&mut Item> {
        self.items
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownItem(id.to_string()))
    }

    /// `<link_property>.<target>`
    fn annotation_path(&self, target: &str) -> Path {
        Path::new(vec![
            Segment::key(self.options.link_property.as_str()),
            Segment::key(target),
        ])
    }

    /// Index a name or title, warning when it was already registered
    fn index_registered(&mut self, value: &str, id: &str) -> StoreResult<()> {
        if !self.index(value, id)? {
            warn!("'{}' is already registered for {}", value, id);
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.last_update = Some(Utc::now());
    }
}
