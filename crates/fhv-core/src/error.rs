//! # Error Types
//!
//! Errors raised while constructing or decoding core values. All variants
//! carry enough context to be shown to a user as-is.

use thiserror::Error;

/// Top-level error type for `fhv-core`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A digest had the wrong number of bytes.
    #[error("digest must be {expected} bytes, got {actual}")]
    DigestLength {
        /// Required length in bytes.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A hex-encoded digest could not be decoded.
    #[error("invalid digest hex: {0}")]
    DigestHex(String),

    /// A record name failed validation.
    #[error("invalid record name: {0}")]
    InvalidName(String),

    /// A timestamp was out of range or malformed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Reading input bytes for a digest failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Failure class for this error when it ends an operation.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Io(_) => FailureKind::DigestComputationFailed,
            Self::DigestLength { .. } | Self::DigestHex(_) | Self::InvalidTimestamp(_) => {
                FailureKind::Storage
            }
            Self::InvalidName(_) => FailureKind::InvalidInput,
        }
    }
}

/// Failure classes a store or verify operation can end in.
///
/// Every error that crosses the workflow boundary is tagged with one of
/// these so callers can render or branch on it without matching on the
/// concrete error type. A non-matching verification is an outcome, not a
/// failure, and has no kind here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The input file could not be read.
    DigestComputationFailed,
    /// A ledger write was attempted without an active signing session.
    AuthorizationMissing,
    /// The ledger contract is unconfigured or could not be found.
    RemoteUnavailable,
    /// The ledger rejected the submitted transaction.
    RemoteRejected,
    /// Transport failure or timeout talking to the ledger.
    Network,
    /// Local durable storage failed or holds a corrupt dataset.
    Storage,
    /// The caller supplied an invalid name or argument.
    InvalidInput,
}

impl FailureKind {
    /// Stable identifier used in logs and the activity log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DigestComputationFailed => "digest_computation_failed",
            Self::AuthorizationMissing => "authorization_missing",
            Self::RemoteUnavailable => "remote_unavailable",
            Self::RemoteRejected => "remote_rejected",
            Self::Network => "network",
            Self::Storage => "storage",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
