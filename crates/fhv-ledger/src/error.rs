//! Ledger client error types and response classification.

use fhv_core::FailureKind;
use fhv_store::StoreError;

use crate::config::ConfigError;

/// Response body fragments meaning the contract or function is not deployed.
const UNAVAILABLE_MARKERS: &[&str] = &[
    "module_not_found",
    "module not found",
    "resource_not_found",
    "function_not_found",
];

/// Response body fragments meaning the transaction was refused.
const REJECTED_MARKERS: &[&str] = &[
    "insufficient_balance",
    "insufficient funds",
    "rejected",
    "declined",
];

/// Errors from ledger calls.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Contract address unset, sentinel, or the module/function is missing.
    #[error("ledger contract unavailable: {reason}")]
    Unavailable { reason: String },

    /// The node, wallet, or VM refused the transaction.
    #[error("transaction rejected: {reason}")]
    Rejected { reason: String },

    /// A write was attempted without a signing session.
    #[error("no active signing session for {operation}")]
    AuthorizationMissing { operation: String },

    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Server-side failure (5xx).
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The transaction stayed pending past the confirmation budget.
    #[error("transaction {hash} not confirmed after {waited_secs}s")]
    ConfirmationTimeout { hash: String, waited_secs: u64 },

    /// Response body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LedgerError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unavailable { .. } | Self::Decode { .. } | Self::Config(_) => {
                FailureKind::RemoteUnavailable
            }
            Self::Rejected { .. } => FailureKind::RemoteRejected,
            Self::AuthorizationMissing { .. } => FailureKind::AuthorizationMissing,
            Self::Http { .. } | Self::Status { .. } | Self::ConfirmationTimeout { .. } => {
                FailureKind::Network
            }
        }
    }

    pub(crate) fn unconfigured() -> Self {
        Self::Unavailable {
            reason: "module address not configured".to_string(),
        }
    }
}

/// Map a non-success HTTP response to a [`LedgerError`].
///
/// Body markers win over the status code; otherwise 5xx is a network
/// failure and any other status is a rejection.
pub(crate) fn classify_response(endpoint: &str, status: u16, body: String) -> LedgerError {
    let lowered = body.to_ascii_lowercase();
    if UNAVAILABLE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return LedgerError::Unavailable { reason: body };
    }
    if REJECTED_MARKERS.iter().any(|m| lowered.contains(m)) {
        return LedgerError::Rejected { reason: body };
    }
    if status >= 500 {
        return LedgerError::Status {
            endpoint: endpoint.to_string(),
            status,
            body,
        };
    }
    LedgerError::Rejected {
        reason: format!("{endpoint} returned {status}: {body}"),
    }
}

impl From<LedgerError> for StoreError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::AuthorizationMissing { operation } => {
                StoreError::AuthorizationMissing { operation }
            }
            LedgerError::Rejected { reason } => StoreError::RemoteRejected { reason },
            other => match other.kind() {
                FailureKind::Network => StoreError::Network {
                    reason: other.to_string(),
                },
                _ => StoreError::RemoteUnavailable {
                    reason: other.to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_missing_is_unavailable() {
        let e = classify_response(
            "view",
            400,
            r#"{"error_code":"module_not_found","message":"Module not found"}"#.into(),
        );
        assert_eq!(e.kind(), FailureKind::RemoteUnavailable);
        let e = classify_response("view", 404, "FUNCTION_NOT_FOUND".into());
        assert_eq!(e.kind(), FailureKind::RemoteUnavailable);
    }

    #[test]
    fn balance_and_declines_are_rejections() {
        for body in ["INSUFFICIENT_BALANCE_FOR_TRANSACTION_FEE", "User declined", "request rejected"] {
            assert_eq!(
                classify_response("submit", 400, body.into()).kind(),
                FailureKind::RemoteRejected
            );
        }
    }

    #[test]
    fn status_fallbacks() {
        assert_eq!(classify_response("view", 503, "busy".into()).kind(), FailureKind::Network);
        assert_eq!(classify_response("view", 400, "bad".into()).kind(), FailureKind::RemoteRejected);
    }

    #[test]
    fn store_error_conversion_keeps_kind() {
        let cases = [
            LedgerError::unconfigured(),
            LedgerError::Rejected { reason: "no".into() },
            LedgerError::AuthorizationMissing { operation: "store".into() },
            LedgerError::ConfirmationTimeout { hash: "0x1".into(), waited_secs: 30 },
            LedgerError::Status { endpoint: "view".into(), status: 502, body: String::new() },
        ];
        for e in cases {
            let kind = e.kind();
            assert_eq!(StoreError::from(e).kind(), kind);
        }
    }
}
