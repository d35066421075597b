//! # RecordStore — the Polymorphic Record Store Interface
//!
//! One interface, two production variants:
//!
//! - **Local** ([`LocalRecordStore`](crate::LocalRecordStore)): in-memory list
//!   mirrored to a durable key-value surface with synchronous write-through.
//! - **Ledger** (`fhv-ledger`): a remote contract reached through view and
//!   entry functions, with confirmation latency and network failure modes.
//!
//! The verification workflow is written once against this trait and receives
//! an explicitly constructed instance. Nothing here is global.
//!
//! ## Matching
//!
//! [`RecordStore::find_by_digest()`] is content-addressed: a file is known if
//! any record's digest equals the candidate digest, whatever its name. The
//! default implementation is a linear scan over [`RecordStore::list_all()`]
//! where the first match wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use fhv_core::{Author, FileDigest, FileRecord, RecordName};

use crate::error::StoreError;

/// Which record store variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Local durable storage ("demo mode" in the browser original).
    #[default]
    Local,
    /// Remote ledger contract ("blockchain mode").
    Ledger,
}

impl StoreMode {
    /// Lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Ledger => "ledger",
        }
    }
}

impl std::fmt::Display for StoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "demo" => Ok(Self::Local),
            "ledger" | "blockchain" => Ok(Self::Ledger),
            other => Err(format!("unknown store mode {other:?} (expected local or ledger)")),
        }
    }
}

/// Capability set shared by every record store variant.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// behind an `Arc` and injected into the workflow.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Which variant this is.
    fn mode(&self) -> StoreMode;

    /// Every known record, in an order that is stable within a session.
    async fn list_all(&self) -> Result<Vec<FileRecord>, StoreError>;

    /// Create a record for `name`, or replace the digest, author and
    /// timestamp of the existing one. The verification count is untouched.
    async fn upsert_by_name(
        &self,
        name: &RecordName,
        digest: &FileDigest,
        author: &Author,
    ) -> Result<FileRecord, StoreError>;

    /// Increment the verification count of `record` by one and persist it.
    /// Returns the updated record.
    async fn record_verification(&self, record: &FileRecord) -> Result<FileRecord, StoreError>;

    /// Delete every record.
    async fn clear_all(&self) -> Result<(), StoreError>;

    /// First record whose digest equals `digest`.
    async fn find_by_digest(&self, digest: &FileDigest) -> Result<Option<FileRecord>, StoreError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|r| r.matches_digest(digest)))
    }

    /// Record stored under `name`. Absence is not an error.
    async fn find_by_name(&self, name: &RecordName) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.list_all().await?.into_iter().find(|r| r.name == *name))
    }

    /// Number of records.
    async fn total_records(&self) -> Result<u64, StoreError> {
        Ok(self.list_all().await?.len() as u64)
    }

    /// Hash of the transaction behind the most recent successful mutation.
    /// Stores without transactions return `None`.
    fn last_transaction(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_original_aliases() {
        assert_eq!("demo".parse::<StoreMode>().unwrap(), StoreMode::Local);
        assert_eq!("Blockchain".parse::<StoreMode>().unwrap(), StoreMode::Ledger);
        assert_eq!(" ledger ".parse::<StoreMode>().unwrap(), StoreMode::Ledger);
        assert!("cloud".parse::<StoreMode>().is_err());
    }

    #[test]
    fn mode_display_and_serde() {
        assert_eq!(StoreMode::Local.to_string(), "local");
        assert_eq!(serde_json::to_string(&StoreMode::Ledger).unwrap(), "\"ledger\"");
        assert_eq!(StoreMode::default(), StoreMode::Local);
    }
}
