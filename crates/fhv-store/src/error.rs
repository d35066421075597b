//! Record store error types.

use fhv_core::{CoreError, FailureKind};
use thiserror::Error;

use crate::store::StoreMode;

/// Errors from any [`RecordStore`](crate::RecordStore) variant.
///
/// Each variant maps onto one [`FailureKind`] via [`StoreError::kind()`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// A ledger write needs a signing session and none is active.
    #[error("no active signing session for {operation}")]
    AuthorizationMissing {
        /// The operation that needed authorization.
        operation: String,
    },

    /// The ledger contract is not configured or cannot be found.
    #[error("ledger unavailable: {reason}")]
    RemoteUnavailable {
        /// Why the ledger is unreachable.
        reason: String,
    },

    /// The ledger rejected a submitted transaction.
    #[error("ledger rejected transaction: {reason}")]
    RemoteRejected {
        /// Rejection reason, verbatim from the ledger or wallet.
        reason: String,
    },

    /// Transport failure or timeout.
    #[error("network error: {reason}")]
    Network {
        /// Transport error detail.
        reason: String,
    },

    /// Local durable storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A persisted dataset could not be decoded.
    #[error("corrupt dataset under key {key}: {reason}")]
    Corrupt {
        /// The key holding the undecodable value.
        key: String,
        /// Decoder error.
        reason: String,
    },

    /// The record to update no longer exists in the store.
    #[error("no record named {name} with the expected digest")]
    NotFound {
        /// The record name that was looked up.
        name: String,
    },

    /// The operation is not available for this store variant.
    #[error("{operation} is not supported by the {mode} store")]
    Unsupported {
        /// The operation that was attempted.
        operation: String,
        /// The store variant.
        mode: StoreMode,
    },

    /// A core value failed validation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// Failure class for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::AuthorizationMissing { .. } => FailureKind::AuthorizationMissing,
            Self::RemoteUnavailable { .. } => FailureKind::RemoteUnavailable,
            Self::RemoteRejected { .. } => FailureKind::RemoteRejected,
            Self::Network { .. } => FailureKind::Network,
            Self::Storage(_) | Self::Corrupt { .. } | Self::NotFound { .. } => FailureKind::Storage,
            Self::Unsupported { .. } => FailureKind::InvalidInput,
            Self::Core(e) => e.kind(),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
