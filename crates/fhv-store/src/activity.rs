//! # Activity Log
//!
//! A bounded, newest-first history of store and verify attempts, persisted
//! under its own key ([`ACTIVITY_KEY`]) so it never touches the record
//! dataset. Holds at most [`MAX_ACTIVITY_ENTRIES`]; older entries fall off.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fhv_core::Timestamp;

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::store::StoreMode;

/// Key under which the activity log is persisted.
pub const ACTIVITY_KEY: &str = "file_hash_verifier_activity";

/// Maximum retained entries.
pub const MAX_ACTIVITY_ENTRIES: usize = 50;

/// Which workflow produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Store,
    Verify,
}

/// Terminal status of the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Failed,
}

/// One store or verify attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub kind: ActivityKind,
    /// File name (store) or the name of the file that was checked (verify).
    pub name: String,
    pub status: ActivityStatus,
    pub mode: StoreMode,
    pub timestamp: Timestamp,
    /// Ledger transaction hash, when one was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    /// Failure description or outcome summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ActivityEntry {
    /// New entry stamped with the current time and a random id.
    pub fn new(
        kind: ActivityKind,
        name: impl Into<String>,
        status: ActivityStatus,
        mode: StoreMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            status,
            mode,
            timestamp: Timestamp::now(),
            transaction: None,
            detail: None,
        }
    }

    /// Attach a transaction hash.
    pub fn with_transaction(mut self, tx: impl Into<String>) -> Self {
        self.transaction = Some(tx.into());
        self
    }

    /// Attach a detail message.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Sink the workflow reports terminal states to.
pub trait ActivityRecorder: Send + Sync {
    fn record(&self, entry: ActivityEntry) -> Result<(), StoreError>;
}

/// Persisted, bounded activity history.
#[derive(Debug)]
pub struct ActivityLog<K> {
    kv: K,
    entries: Mutex<Vec<ActivityEntry>>,
}

impl<K: KeyValueStore> ActivityLog<K> {
    /// Load the log from `kv`. An absent key is an empty log.
    pub fn open(kv: K) -> Result<Self, StoreError> {
        let entries = match kv.get(ACTIVITY_KEY)? {
            None => Vec::new(),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                key: ACTIVITY_KEY.to_string(),
                reason: e.to_string(),
            })?,
        };
        Ok(Self {
            kv,
            entries: Mutex::new(entries),
        })
    }

    /// Prepend `entry`, drop anything past the cap, and persist.
    pub fn push(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        let mut guard = self.entries.lock();
        let mut next = Vec::with_capacity(MAX_ACTIVITY_ENTRIES);
        next.push(entry);
        next.extend(guard.iter().take(MAX_ACTIVITY_ENTRIES - 1).cloned());
        let json = serde_json::to_string(&next)
            .map_err(|e| StoreError::Storage(format!("encode activity: {e}")))?;
        self.kv.set(ACTIVITY_KEY, &json)?;
        *guard = next;
        Ok(())
    }

    /// All retained entries, newest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().clone()
    }

    /// Drop every entry.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.entries.lock();
        self.kv.remove(ACTIVITY_KEY)?;
        guard.clear();
        Ok(())
    }
}

impl<K: KeyValueStore> ActivityRecorder for ActivityLog<K> {
    fn record(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        self.push(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;

    fn entry(i: usize) -> ActivityEntry {
        ActivityEntry::new(
            ActivityKind::Store,
            format!("file-{i}"),
            ActivityStatus::Success,
            StoreMode::Local,
        )
    }

    #[test]
    fn newest_first_and_capped() {
        let log = ActivityLog::open(MemoryKeyValueStore::new()).unwrap();
        for i in 0..(MAX_ACTIVITY_ENTRIES + 5) {
            log.push(entry(i)).unwrap();
        }
        let entries = log.entries();
        assert_eq!(entries.len(), MAX_ACTIVITY_ENTRIES);
        assert_eq!(entries[0].name, format!("file-{}", MAX_ACTIVITY_ENTRIES + 4));
        assert_eq!(entries.last().unwrap().name, "file-5");
    }

    #[test]
    fn persists_across_reopen() {
        let kv = MemoryKeyValueStore::new();
        let log = ActivityLog::open(kv.clone()).unwrap();
        log.push(entry(1).with_transaction("0xfeed").with_detail("ok")).unwrap();
        let reopened = ActivityLog::open(kv).unwrap();
        let entries = reopened.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].transaction.as_deref(), Some("0xfeed"));
        assert_eq!(entries[0].detail.as_deref(), Some("ok"));
    }

    #[test]
    fn failed_write_leaves_log_unchanged() {
        let kv = MemoryKeyValueStore::new();
        let log = ActivityLog::open(kv.clone()).unwrap();
        log.push(entry(1)).unwrap();
        kv.set_fail_writes(true);
        assert!(log.push(entry(2)).is_err());
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn clear_empties_log() {
        let log = ActivityLog::open(MemoryKeyValueStore::new()).unwrap();
        log.push(entry(1)).unwrap();
        log.clear().unwrap();
        assert!(log.entries().is_empty());
    }
}
