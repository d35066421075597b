//! # Key-Value Durable Surface
//!
//! The flat storage the local store writes through to. Each logical dataset
//! lives under one fixed key; the value is the full serialized dataset, so
//! replacing a key replaces the dataset as a unit.
//!
//! - [`FileKeyValueStore`]: one `{key}.json` file per key under a data
//!   directory. Writes go to a temporary sibling and are renamed into place,
//!   so readers never observe a half-written dataset.
//! - [`MemoryKeyValueStore`]: process memory, shared across clones. Used in
//!   tests; can be told to fail writes.
//!
//! Keys must match `^[a-z0-9][a-z0-9_-]{0,63}$`.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;

/// A flat string-keyed, string-valued durable surface.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => {
            return Err(StoreError::Storage(format!(
                "key must start with [a-z0-9], got {key:?}"
            )))
        }
    }
    if key.len() > 64 {
        return Err(StoreError::Storage(format!(
            "key too long: {} chars (max 64)",
            key.len()
        )));
    }
    if let Some(c) = chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')) {
        return Err(StoreError::Storage(format!(
            "key contains invalid character {c:?}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FileKeyValueStore
// ---------------------------------------------------------------------------

/// Key-value surface backed by one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Storage(format!("read {key}: {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::Storage(format!("create {}: {e}", self.dir.display())))?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(|e| StoreError::Storage(format!("write {key}: {e}")))?;
        fs::rename(&tmp, &target).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Storage(format!("commit {key}: {e}"))
        })?;
        tracing::trace!(key, path = %target.display(), bytes = value.len(), "wrote dataset");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Storage(format!("remove {key}: {e}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryKeyValueStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    fail_writes: bool,
}

/// In-memory key-value surface. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail until turned off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Raw value under `key`, bypassing validation. For assertions.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().values.get(key).cloned()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.inner.lock().values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(StoreError::Storage(format!("write {key}: quota exceeded")));
        }
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(StoreError::Storage(format!("remove {key}: quota exceeded")));
        }
        inner.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(validate_key("file_hash_verifier_demo_files").is_ok());
        assert!(validate_key("a-b_c9").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("_leading").is_err());
        assert!(validate_key("Upper").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKeyValueStore::new(dir.path().join("nested"));
        assert_eq!(kv.get("records").unwrap(), None);
        kv.set("records", "[]").unwrap();
        assert_eq!(kv.get("records").unwrap().as_deref(), Some("[]"));
        kv.set("records", "[1]").unwrap();
        assert_eq!(kv.get("records").unwrap().as_deref(), Some("[1]"));
        assert!(dir.path().join("nested").join("records.json").exists());
        assert!(!dir.path().join("nested").join(".records.json.tmp").exists());
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKeyValueStore::new(dir.path());
        kv.set("k", "v").unwrap();
        kv.remove("k").unwrap();
        kv.remove("k").unwrap();
        assert_eq!(kv.get("k").unwrap(), None);
    }

    #[test]
    fn file_store_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKeyValueStore::new(dir.path());
        kv.set("a", "1").unwrap();
        kv.set("b", "2").unwrap();
        kv.remove("a").unwrap();
        assert_eq!(kv.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn memory_store_shares_state_across_clones() {
        let kv = MemoryKeyValueStore::new();
        let other = kv.clone();
        kv.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn memory_store_write_failure() {
        let kv = MemoryKeyValueStore::new();
        kv.set("k", "v").unwrap();
        kv.set_fail_writes(true);
        assert!(kv.set("k", "w").is_err());
        assert!(kv.remove("k").is_err());
        assert_eq!(kv.raw("k").as_deref(), Some("v"));
    }
}
