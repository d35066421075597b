//! # Signing Sessions
//!
//! Ledger writes are entry function transactions that must be signed by the
//! connected account. This crate never holds keys: a [`SigningSession`] takes
//! an unsigned [`EntryFunctionPayload`], signs and submits it, and returns
//! the transaction hash.
//!
//! [`WalletBridgeSession`] talks to a local wallet bridge over HTTP:
//!
//! | Method | Path | Body / Response |
//! |--------|------|-----------------|
//! | GET    | `/account` | `{"address": "0x..."}` |
//! | POST   | `/sign_and_submit` | `{"sender", "payload"}` / `{"hash": "0x..."}` |
//!
//! 401 and 403 mean the wallet is not connected or refused access and map to
//! [`LedgerError::AuthorizationMissing`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use fhv_core::{Author, FileDigest, RecordName};

use crate::config::ModuleAddress;
use crate::error::{classify_response, LedgerError};
use crate::retry::RetryPolicy;

/// Unsigned entry function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    /// Fully qualified function id.
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl EntryFunctionPayload {
    /// A `(name, digest)` call, with the digest as an array of byte numbers.
    pub fn file_call(
        address: &ModuleAddress,
        function: &str,
        name: &RecordName,
        digest: &FileDigest,
    ) -> Self {
        Self {
            payload_type: "entry_function_payload".to_string(),
            function: address.function_id(function),
            type_arguments: Vec::new(),
            arguments: vec![
                Value::String(name.as_str().to_string()),
                Value::Array(digest.as_bytes().iter().map(|b| Value::from(*b)).collect()),
            ],
        }
    }
}

/// Hash of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub hash: String,
}

impl TransactionHandle {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
}

impl std::fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hash)
    }
}

/// An account able to sign and submit entry function transactions.
#[async_trait]
pub trait SigningSession: Send + Sync {
    /// The connected account, recorded as the author of stored records.
    fn account(&self) -> Author;

    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<TransactionHandle, LedgerError>;
}

#[derive(Deserialize)]
struct AccountResponse {
    address: String,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    sender: &'a str,
    payload: &'a EntryFunctionPayload,
}

/// Signing session backed by an HTTP wallet bridge.
#[derive(Clone)]
pub struct WalletBridgeSession {
    http: reqwest::Client,
    bridge_url: Url,
    token: Option<String>,
    account: Author,
}

impl std::fmt::Debug for WalletBridgeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletBridgeSession")
            .field("bridge_url", &self.bridge_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("account", &self.account)
            .finish()
    }
}

impl WalletBridgeSession {
    /// Ask the bridge for the connected account.
    pub async fn connect(
        http: reqwest::Client,
        bridge_url: Url,
        token: Option<String>,
    ) -> Result<Self, LedgerError> {
        Self::connect_with(http, bridge_url, token, RetryPolicy::default()).await
    }

    /// [`connect`](Self::connect) with an explicit backoff for the account
    /// lookup.
    pub async fn connect_with(
        http: reqwest::Client,
        bridge_url: Url,
        token: Option<String>,
        retry: RetryPolicy,
    ) -> Result<Self, LedgerError> {
        let endpoint = join(&bridge_url, "account");
        let resp = retry
            .read(&endpoint, || authorized(http.get(&endpoint), token.as_deref()).send())
            .await
            .map_err(|source| LedgerError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        let status = resp.status().as_u16();
        if status == 401 || status == 403 {
            return Err(LedgerError::AuthorizationMissing {
                operation: "wallet connect".to_string(),
            });
        }
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_response(&endpoint, status, body));
        }
        let account: AccountResponse = resp.json().await.map_err(|e| LedgerError::Decode {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        tracing::info!(account = %account.address, "wallet bridge connected");
        Ok(Self {
            http,
            bridge_url,
            token,
            account: Author::new(account.address),
        })
    }
}

#[async_trait]
impl SigningSession for WalletBridgeSession {
    fn account(&self) -> Author {
        self.account.clone()
    }

    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<TransactionHandle, LedgerError> {
        let endpoint = join(&self.bridge_url, "sign_and_submit");
        let body = SubmitRequest {
            sender: self.account.as_str(),
            payload,
        };
        // Submission is not idempotent, so it is sent once.
        let resp = authorized(self.http.post(&endpoint), self.token.as_deref())
            .json(&body)
            .send()
            .await
            .map_err(|source| LedgerError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        let status = resp.status().as_u16();
        if status == 401 || status == 403 {
            return Err(LedgerError::AuthorizationMissing {
                operation: payload.function.clone(),
            });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_response(&endpoint, status, text));
        }
        let handle: TransactionHandle = resp.json().await.map_err(|e| LedgerError::Decode {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(function = %payload.function, tx = %handle, "transaction submitted");
        Ok(handle)
    }
}

fn authorized(req: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(t) => req.bearer_auth(t),
        None => req,
    }
}

fn join(base: &Url, path: &str) -> String {
    format!("{}/{path}", base.as_str().trim_end_matches('/'))
}
