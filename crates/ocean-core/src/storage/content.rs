//! Content store backends
//!
//! The store only ever needs four filesystem capabilities: test for a
//! path, read a JSON document, write a JSON document, and create a
//! directory (plus removing a stale single-file snapshot). They are
//! expressed by [`ContentStore`] so snapshots can target the real
//! filesystem or an in-memory map.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use super::error::{StorageError, StorageResult};

/// Synchronous JSON document storage
///
/// Every failure is returned to the caller; nothing is retried.
pub trait ContentStore {
    /// Check whether a file exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Read and parse the JSON document at `path`
    fn read_json(&self, path: &Path) -> StorageResult<Value>;

    /// Serialize `value` to `path`, creating parent directories
    fn write_json(&self, path: &Path, value: &Value) -> StorageResult<()>;

    /// Create `path` and all missing parents
    fn make_dir(&self, path: &Path) -> StorageResult<()>;

    /// Remove the file at `path` if it exists
    fn remove(&self, path: &Path) -> StorageResult<()>;
}

/// Filesystem-backed content store
#[derive(Debug, Clone, Copy, Default)]
pub struct FsContentStore;

impl FsContentStore {
    pub fn new() -> Self {
        Self
    }
}

impl ContentStore for FsContentStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_json(&self, path: &Path) -> StorageResult<Value> {
        let bytes = fs::read(path).map_err(|e| StorageError::from_read_io(e, path.to_path_buf()))?;
        debug!("Read {} bytes from {:?}", bytes.len(), path);
        serde_json::from_slice(&bytes).map_err(|e| StorageError::InvalidJson {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    fn write_json(&self, path: &Path, value: &Value) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|e| StorageError::InvalidJson {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        atomic_write(path, &bytes)?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    fn make_dir(&self, path: &Path) -> StorageResult<()> {
        fs::create_dir_all(path).map_err(|source| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        })
    }

    fn remove(&self, path: &Path) -> StorageResult<()> {
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(path).map_err(|source| StorageError::RemoveError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let temp_path = temp_path_for(path);

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::from_io(e, path.to_path_buf()))
}

/// `<name>.tmp` next to `path`, keeping the full file name
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Debug, Default)]
struct MemoryFiles {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

/// In-memory content store
///
/// Clones share the same files, so a caller can keep a handle and inspect
/// what a store wrote. Documents are kept serialized so reads go through
/// the same JSON parsing as the filesystem backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    inner: Rc<RefCell<MemoryFiles>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of every stored file, in order
    pub fn files(&self) -> Vec<PathBuf> {
        self.inner.borrow().files.keys().cloned().collect()
    }

    /// Check whether a directory was created
    pub fn has_dir(&self, path: &Path) -> bool {
        self.inner.borrow().dirs.contains(path)
    }

    /// Store raw bytes at a path (used to simulate hand-edited files)
    pub fn put_raw(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.inner
            .borrow_mut()
            .files
            .insert(path.into(), bytes.into());
    }
}

impl ContentStore for MemoryContentStore {
    fn exists(&self, path: &Path) -> bool {
        self.inner.borrow().files.contains_key(path)
    }

    fn read_json(&self, path: &Path) -> StorageResult<Value> {
        let inner = self.inner.borrow();
        let bytes = inner.files.get(path).ok_or_else(|| StorageError::NotFound {
            path: path.to_path_buf(),
        })?;
        serde_json::from_slice(bytes).map_err(|e| StorageError::InvalidJson {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    fn write_json(&self, path: &Path, value: &Value) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|e| StorageError::InvalidJson {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        let mut inner = self.inner.borrow_mut();
        if let Some(parent) = path.parent() {
            inner.dirs.insert(parent.to_path_buf());
        }
        inner.files.insert(path.to_path_buf(), bytes);
        Ok(())
    }

    fn make_dir(&self, path: &Path) -> StorageResult<()> {
        self.inner.borrow_mut().dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn remove(&self, path: &Path) -> StorageResult<()> {
        self.inner.borrow_mut().files.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_fs_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsContentStore::new();
        let path = temp_dir.path().join("doc.json");

        assert!(!store.exists(&path));
        store.write_json(&path, &json!({"a": [1, 2]})).unwrap();
        assert!(store.exists(&path));
        assert_eq!(store.read_json(&path).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_fs_write_leaves_sibling_tmp_alone() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsContentStore::new();
        let unrelated = temp_dir.path().join("ocean.tmp");
        fs::write(&unrelated, b"keep me").unwrap();

        let path = temp_dir.path().join("ocean.json");
        store.write_json(&path, &json!({"ok": true})).unwrap();

        assert_eq!(fs::read(&unrelated).unwrap(), b"keep me");
        assert!(!temp_dir.path().join("ocean.json.tmp").exists());
        assert_eq!(
            temp_path_for(&path),
            temp_dir.path().join("ocean.json.tmp")
        );
    }

    #[test]
    fn test_fs_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b").join("c").join("doc.json");

        FsContentStore::new().write_json(&nested, &json!(true)).unwrap();

        assert!(nested.exists());
        assert!(!temp_path_for(&nested).exists());
        assert_eq!(fs::read_to_string(&nested).unwrap(), "true");
    }

    #[test]
    fn test_fs_read_missing_and_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsContentStore::new();

        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            store.read_json(&missing),
            Err(StorageError::NotFound { .. })
        ));

        let broken = temp_dir.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();
        assert!(matches!(
            store.read_json(&broken),
            Err(StorageError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_fs_make_dir_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsContentStore::new();
        let dir = temp_dir.path().join("x").join("y");

        store.make_dir(&dir).unwrap();
        assert!(dir.is_dir());

        let file = dir.join("f.json");
        store.write_json(&file, &json!(1)).unwrap();
        store.remove(&file).unwrap();
        assert!(!file.exists());

        // Removing a missing file is not an error
        store.remove(&file).unwrap();
    }

    #[test]
    fn test_memory_store_shares_state_between_clones() {
        let store = MemoryContentStore::new();
        let handle = store.clone();
        let path = PathBuf::from("/mem/doc.json");

        store.write_json(&path, &json!({"k": "v"})).unwrap();

        assert!(handle.exists(&path));
        assert_eq!(handle.files(), vec![path.clone()]);
        assert!(handle.has_dir(Path::new("/mem")));
        assert_eq!(handle.read_json(&path).unwrap(), json!({"k": "v"}));

        handle.remove(&path).unwrap();
        assert!(!store.exists(&path));
    }

    #[test]
    fn test_memory_store_invalid_json() {
        let store = MemoryContentStore::new();
        store.put_raw("/mem/bad.json", "oops");

        assert!(matches!(
            store.read_json(Path::new("/mem/bad.json")),
            Err(StorageError::InvalidJson { .. })
        ));
        assert!(matches!(
            store.read_json(Path::new("/mem/none.json")),
            Err(StorageError::NotFound { .. })
        ));
    }
}
