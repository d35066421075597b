//! # fhv-ledger — Ledger-Backed Record Store
//!
//! Stores and verifies file digests on a deployed `file_hash_verifier`
//! contract reached through a fullnode REST interface.
//!
//! - [`LedgerClient`]: view functions and transaction confirmation.
//! - [`SigningSession`]: the seam through which entry functions are signed
//!   and submitted. [`WalletBridgeSession`] is the HTTP implementation.
//! - [`LedgerRecordStore`]: the ledger variant of
//!   [`RecordStore`](fhv_store::RecordStore).
//! - [`FakeLedger`] (feature `fake`): in-memory contract double.
//!
//! ## Security Invariant
//!
//! This crate never holds signing keys. Writes are only possible through a
//! [`SigningSession`] supplied by the caller.
//!
//! ## Unconfigured Contract
//!
//! With no module address, or the placeholder `0x1`, every operation fails
//! with `RemoteUnavailable` before any request is sent.

pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod retry;
pub mod signer;
pub mod store;

pub use client::LedgerClient;
pub use config::{ConfigError, LedgerConfig, LedgerNetwork, ModuleAddress};
pub use error::LedgerError;
pub use retry::RetryPolicy;
#[cfg(any(test, feature = "fake"))]
pub use fake::FakeLedger;
pub use signer::{EntryFunctionPayload, SigningSession, TransactionHandle, WalletBridgeSession};
pub use store::LedgerRecordStore;
