//! # fhv-store — Record Stores
//!
//! The [`RecordStore`] interface the verification workflow is written
//! against, plus everything that lives on the local side of it:
//!
//! - [`LocalRecordStore`]: write-through record store over a
//!   [`KeyValueStore`] surface.
//! - [`FileKeyValueStore`] / [`MemoryKeyValueStore`]: the durable surfaces.
//! - [`ActivityLog`]: bounded history of store and verify attempts.
//! - [`StoreStats`]: aggregates for the dashboard view.
//!
//! The ledger variant lives in `fhv-ledger` and implements the same trait.
//!
//! ## Crate Policy
//!
//! - Depends only on `fhv-core` internally.
//! - Every mutation is persisted before it becomes visible in memory.
//! - No `.unwrap()` outside tests.

pub mod activity;
pub mod error;
pub mod kv;
pub mod local;
pub mod stats;
pub mod store;

pub use activity::{
    ActivityEntry, ActivityKind, ActivityLog, ActivityRecorder, ActivityStatus, ACTIVITY_KEY,
    MAX_ACTIVITY_ENTRIES,
};
pub use error::StoreError;
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use local::{LocalRecordStore, FILE_RECORDS_KEY};
pub use stats::{growth_percentage, StoreStats};
pub use store::{RecordStore, StoreMode};
