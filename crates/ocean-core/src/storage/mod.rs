//! Storage layer
//!
//! Handles snapshot persistence through a pluggable content store.
//!
//! ## Architecture
//!
//! - **ContentStore**: the four file operations a store needs, backed by
//!   the filesystem or by memory
//! - **Snapshot**: the flat JSON layout of items, index and links

pub mod content;
pub mod error;
pub mod snapshot;

pub use content::{ContentStore, FsContentStore, MemoryContentStore};
pub use error::{StorageError, StorageResult};
pub use snapshot::{Layout, Snapshot, SnapshotRef, StoreKind};
