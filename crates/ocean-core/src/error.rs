//! Store error handling
//!
//! Contract violations (empty paths, container mismatches, unknown ids,
//! too many index matches, a bad snapshot destination) are reported as
//! typed errors carrying the offending values. Filesystem failures come
//! from the storage layer and are wrapped unchanged.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during store and item operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A path with no segments was used to read or write a property
    #[error("Assertion failed: cannot address a property without a path")]
    EmptyPath,

    /// The container at a path segment cannot take that segment
    #[error("Assertion failed: cannot apply segment '{segment}' to {found}")]
    ContainerMismatch { segment: String, found: String },

    /// An item without an id was pushed
    #[error("Assertion failed: cannot push an item without an id")]
    MissingId,

    /// No item exists for the id
    #[error("Assertion failed: unknown item '{0}'")]
    UnknownItem(String),

    /// An index lookup returned more ids than the caller allowed
    #[error("Assertion failed: too many results for '{value}' (max {max}): {found:?}")]
    TooManyMatches {
        value: String,
        max: usize,
        found: Vec<String>,
    },

    /// A lookup expected a unique match and found several
    #[error("Assertion failed: '{value}' is not unique: {matches:?}")]
    AmbiguousMatch { value: String, matches: Vec<String> },

    /// Single-file snapshots must be written to a `.json` file
    #[error("Assertion failed: snapshot destination '{0}' must have a .json extension")]
    InvalidDestination(PathBuf),

    /// Filesystem failure while loading or saving
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Snapshot contents could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error reports a caller contract violation rather than
    /// an environment failure
    pub fn is_contract_violation(&self) -> bool {
        !matches!(
            self,
            StoreError::Storage(_) | StoreError::Serialization(_)
        )
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
