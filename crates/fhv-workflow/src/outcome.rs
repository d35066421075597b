//! # Tagged Outcomes
//!
//! Nothing a record store raises crosses the workflow boundary as an error
//! type. Failures become a [`WorkflowFailure`] carrying a [`FailureKind`] and
//! a message fit for display; successful operations become a
//! [`StoreOutcome`] or [`VerificationOutcome`]. A content mismatch is a
//! `VerificationOutcome` with `matched == false`, not a failure.

use serde::Serialize;

use fhv_core::{Author, CoreError, FailureKind, FileDigest, FileRecord, RecordName, Timestamp};
use fhv_store::{StoreError, StoreMode};

/// A store or verify attempt that ended without a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowFailure {
    pub kind: FailureKind,
    /// What to tell the user.
    pub message: String,
    /// The underlying error, verbatim.
    pub detail: String,
}

impl WorkflowFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let message = match kind {
            FailureKind::DigestComputationFailed => format!("Could not read the file: {detail}"),
            FailureKind::AuthorizationMissing => {
                "Connect a wallet to sign ledger transactions.".to_string()
            }
            FailureKind::RemoteUnavailable => {
                "The ledger contract is not deployed or its address is not configured. \
                 Local mode is available instead."
                    .to_string()
            }
            FailureKind::RemoteRejected => format!("Transaction rejected: {detail}"),
            FailureKind::Network => {
                "Failed to reach the ledger. Please check your connection and try again."
                    .to_string()
            }
            FailureKind::Storage => format!("Local storage failed: {detail}"),
            FailureKind::InvalidInput => detail.clone(),
        };
        Self {
            kind,
            message,
            detail,
        }
    }

    /// Whether switching to the local store is a sensible next step.
    pub fn suggests_local_fallback(&self) -> bool {
        self.kind == FailureKind::RemoteUnavailable
    }
}

impl std::fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for WorkflowFailure {}

impl From<StoreError> for WorkflowFailure {
    fn from(e: StoreError) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

impl From<CoreError> for WorkflowFailure {
    fn from(e: CoreError) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

/// Result of a successful store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreOutcome {
    pub record: FileRecord,
    /// An existing record under the same name was replaced.
    pub replaced: bool,
    pub mode: StoreMode,
    pub transaction: Option<String>,
    pub message: String,
}

impl StoreOutcome {
    pub(crate) fn new(
        record: FileRecord,
        replaced: bool,
        mode: StoreMode,
        transaction: Option<String>,
    ) -> Self {
        let message = match (&transaction, replaced) {
            (Some(tx), _) => format!(
                "File stored on the ledger. TX: {}...",
                tx.chars().take(16).collect::<String>()
            ),
            (None, true) => format!("Updated the stored hash for {}.", record.name),
            (None, false) => format!("Stored the hash for {}.", record.name),
        };
        Self {
            record,
            replaced,
            mode,
            transaction,
            message,
        }
    }
}

/// Result of a verification that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub matched: bool,
    /// Name of the file that was checked.
    pub candidate_name: String,
    pub digest: FileDigest,
    /// The matching record, with its count after this verification.
    pub record: Option<FileRecord>,
    pub mode: StoreMode,
    pub transaction: Option<String>,
    pub message: String,
    /// Set when the content matched but the count could not be recorded.
    pub recording_failure: Option<WorkflowFailure>,
}

impl VerificationOutcome {
    pub(crate) fn not_matched(candidate_name: String, digest: FileDigest, mode: StoreMode) -> Self {
        let message = match mode {
            StoreMode::Local => {
                "This file content has never been stored in the system. \
                 The file may be new, modified, or corrupted."
            }
            StoreMode::Ledger => {
                "This file content has never been stored on the ledger. \
                 The file may be new, modified, or corrupted."
            }
        };
        Self {
            matched: false,
            candidate_name,
            digest,
            record: None,
            mode,
            transaction: None,
            message: message.to_string(),
            recording_failure: None,
        }
    }

    pub(crate) fn matched(
        candidate_name: String,
        digest: FileDigest,
        record: FileRecord,
        mode: StoreMode,
        transaction: Option<String>,
        recording_failure: Option<WorkflowFailure>,
    ) -> Self {
        let message = match (&recording_failure, mode) {
            (Some(_), StoreMode::Ledger) => {
                "File content is authentic! (Transaction failed but verification successful)"
            }
            (Some(_), StoreMode::Local) => {
                "File content is authentic! (The verification count could not be saved)"
            }
            (None, StoreMode::Ledger) => "File content is authentic and verified on the ledger!",
            (None, StoreMode::Local) => "File content is authentic and matches the stored record!",
        };
        Self {
            matched: true,
            candidate_name,
            digest,
            record: Some(record),
            mode,
            transaction,
            message: message.to_string(),
            recording_failure,
        }
    }

    /// Name the content was originally stored under.
    pub fn original_name(&self) -> Option<&RecordName> {
        self.record.as_ref().map(|r| &r.name)
    }

    pub fn author(&self) -> Option<&Author> {
        self.record.as_ref().map(|r| &r.author)
    }

    pub fn stored_at(&self) -> Option<Timestamp> {
        self.record.as_ref().map(|r| r.stored_at)
    }

    pub fn verification_count(&self) -> Option<u64> {
        self.record.as_ref().map(|r| r.verification_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_suggests_fallback() {
        assert!(WorkflowFailure::new(FailureKind::RemoteUnavailable, "x").suggests_local_fallback());
        assert!(!WorkflowFailure::new(FailureKind::Network, "x").suggests_local_fallback());
    }

    #[test]
    fn rejection_reason_is_verbatim() {
        let f = WorkflowFailure::from(StoreError::RemoteRejected {
            reason: "INSUFFICIENT_BALANCE_FOR_TRANSACTION_FEE".into(),
        });
        assert_eq!(f.kind, FailureKind::RemoteRejected);
        assert!(f.message.contains("INSUFFICIENT_BALANCE_FOR_TRANSACTION_FEE"));
    }

    #[test]
    fn unreadable_input_is_digest_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let f = WorkflowFailure::from(CoreError::from(io));
        assert_eq!(f.kind, FailureKind::DigestComputationFailed);
        assert!(f.message.starts_with("Could not read the file"));
    }
}
