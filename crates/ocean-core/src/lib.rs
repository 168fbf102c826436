//! Ocean Core Library
//!
//! This crate provides the core functionality for Ocean, an embedded
//! document store for schema-less items with a value index and a link
//! graph.
//!
//! # Architecture
//!
//! - **Items**: records addressed by dotted property paths
//! - **Value index**: value → item ids, many-to-many
//! - **Link index**: incoming/outgoing adjacency derived from link
//!   annotations on items
//!
//! Everything lives in memory and is persisted as flat JSON snapshots.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open(Config::load()?.store_options())?;
//!
//! // Create a named identity
//! let id = store.identity(Some("Ocean"), None, None)?;
//!
//! // Look it up again
//! let found = store.from_index("Ocean", Some(models::IDENTITY), Some(1))?;
//! store.save()?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `item`: Items and property paths
//! - `index` / `links`: The derived structures
//! - `id`: Timestamp and random identifiers
//! - `fingerprint`: Content hashes
//! - `storage`: Snapshot persistence
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod id;
pub mod index;
pub mod item;
pub mod links;
pub mod path;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use id::IdGenerator;
pub use index::ValueIndex;
pub use item::{models, Item};
pub use links::{Adjacency, LinkIndex};
pub use path::{Path, Segment};
pub use storage::{ContentStore, FsContentStore, MemoryContentStore, StorageError, StoreKind};
pub use store::{Store, StoreOptions, StoreStats};
