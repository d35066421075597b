//! # Local Record Store
//!
//! Keeps the record set in memory and mirrors it, whole, to a
//! [`KeyValueStore`] under [`FILE_RECORDS_KEY`] after every mutation.
//!
//! ## Write-Through Invariant
//!
//! A mutation is built on a copy of the in-memory list, persisted, and only
//! then swapped in. If the durable write fails, the in-memory list is left
//! exactly as it was and the caller gets [`StoreError::Storage`]. After any
//! successful mutation, a fresh [`LocalRecordStore::open()`] on the same
//! surface observes the same records.

use async_trait::async_trait;
use parking_lot::Mutex;

use fhv_core::{Author, FileDigest, FileRecord, RecordName, Timestamp};

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::store::{RecordStore, StoreMode};

/// Key under which the full record dataset is persisted.
pub const FILE_RECORDS_KEY: &str = "file_hash_verifier_demo_files";

/// Record store over a local key-value surface.
#[derive(Debug)]
pub struct LocalRecordStore<K> {
    kv: K,
    records: Mutex<Vec<FileRecord>>,
}

impl<K: KeyValueStore> LocalRecordStore<K> {
    /// Load the persisted dataset from `kv`.
    ///
    /// An absent key is an empty store. A present but undecodable value is
    /// [`StoreError::Corrupt`]; it is never silently discarded.
    pub fn open(kv: K) -> Result<Self, StoreError> {
        let records = match kv.get(FILE_RECORDS_KEY)? {
            None => Vec::new(),
            Some(raw) if raw.trim().is_empty() => Vec::new(),
            Some(raw) => serde_json::from_str::<Vec<FileRecord>>(&raw).map_err(|e| {
                StoreError::Corrupt {
                    key: FILE_RECORDS_KEY.to_string(),
                    reason: e.to_string(),
                }
            })?,
        };
        tracing::debug!(records = records.len(), "opened local record store");
        Ok(Self {
            kv,
            records: Mutex::new(records),
        })
    }

    /// The underlying key-value surface.
    pub fn kv(&self) -> &K {
        &self.kv
    }

    fn persist(&self, records: &[FileRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)
            .map_err(|e| StoreError::Storage(format!("encode records: {e}")))?;
        self.kv.set(FILE_RECORDS_KEY, &json)
    }

    /// Apply `f` to a copy of the records, persist, then commit in memory.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Vec<FileRecord>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.records.lock();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

#[async_trait]
impl<K: KeyValueStore> RecordStore for LocalRecordStore<K> {
    fn mode(&self) -> StoreMode {
        StoreMode::Local
    }

    async fn list_all(&self) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self.records.lock().clone())
    }

    async fn upsert_by_name(
        &self,
        name: &RecordName,
        digest: &FileDigest,
        author: &Author,
    ) -> Result<FileRecord, StoreError> {
        let now = Timestamp::now();
        let record = self.mutate(|records| {
            match records.iter_mut().find(|r| r.name == *name) {
                Some(existing) => {
                    existing.replace_content(*digest, author.clone(), now);
                    Ok(existing.clone())
                }
                None => {
                    let record = FileRecord::new(name.clone(), *digest, author.clone(), now);
                    records.push(record.clone());
                    Ok(record)
                }
            }
        })?;
        tracing::info!(name = %record.name, digest = %record.digest.short_hex(16), "stored record");
        Ok(record)
    }

    async fn record_verification(&self, record: &FileRecord) -> Result<FileRecord, StoreError> {
        let updated = self.mutate(|records| {
            let target = records
                .iter_mut()
                .find(|r| r.name == record.name && r.matches_digest(&record.digest))
                .ok_or_else(|| StoreError::NotFound {
                    name: record.name.to_string(),
                })?;
            target.record_verification();
            Ok(target.clone())
        })?;
        tracing::debug!(
            name = %updated.name,
            count = updated.verification_count,
            "recorded verification"
        );
        Ok(updated)
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let mut guard = self.records.lock();
        self.kv.remove(FILE_RECORDS_KEY)?;
        let dropped = guard.len();
        guard.clear();
        tracing::info!(dropped, "cleared local record store");
        Ok(())
    }

    async fn total_records(&self) -> Result<u64, StoreError> {
        Ok(self.records.lock().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;
    use fhv_core::sha256_digest;

    fn name(s: &str) -> RecordName {
        RecordName::new(s).unwrap()
    }

    #[tokio::test]
    async fn empty_surface_opens_empty() {
        let store = LocalRecordStore::open(MemoryKeyValueStore::new()).unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(store.total_records().await.unwrap(), 0);
        assert_eq!(store.mode(), StoreMode::Local);
    }

    #[tokio::test]
    async fn upsert_creates_then_replaces() {
        let store = LocalRecordStore::open(MemoryKeyValueStore::new()).unwrap();
        let a = sha256_digest(b"first");
        let b = sha256_digest(b"second");

        let created = store.upsert_by_name(&name("doc.txt"), &a, &Author::placeholder()).await.unwrap();
        assert_eq!(created.verification_count, 0);
        store.record_verification(&created).await.unwrap();

        let replaced = store
            .upsert_by_name(&name("doc.txt"), &b, &Author::new("0xabc"))
            .await
            .unwrap();
        assert_eq!(replaced.digest, b);
        assert_eq!(replaced.author.as_str(), "0xabc");
        assert_eq!(replaced.verification_count, 1);
        assert_eq!(store.total_records().await.unwrap(), 1);
        assert!(store.find_by_digest(&a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_dataset_is_reported() {
        let kv = MemoryKeyValueStore::new();
        kv.set(FILE_RECORDS_KEY, "{not json").unwrap();
        match LocalRecordStore::open(kv) {
            Err(StoreError::Corrupt { key, .. }) => assert_eq!(key, FILE_RECORDS_KEY),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verification_of_unknown_record_is_not_found() {
        let store = LocalRecordStore::open(MemoryKeyValueStore::new()).unwrap();
        let ghost = FileRecord::new(
            name("ghost"),
            sha256_digest(b"x"),
            Author::placeholder(),
            Timestamp::now(),
        );
        let err = store.record_verification(&ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn failed_clear_keeps_records() {
        let kv = MemoryKeyValueStore::new();
        let store = LocalRecordStore::open(kv.clone()).unwrap();
        store
            .upsert_by_name(&name("a"), &sha256_digest(b"a"), &Author::placeholder())
            .await
            .unwrap();
        kv.set_fail_writes(true);
        assert!(store.clear_all().await.is_err());
        assert_eq!(store.total_records().await.unwrap(), 1);
    }
}
