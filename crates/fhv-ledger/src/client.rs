//! # Ledger Client
//!
//! Typed access to the `file_hash_verifier` contract through a fullnode's
//! REST interface.
//!
//! ## Endpoints
//!
//! | Method | Path | Use |
//! |--------|------|-----|
//! | POST   | `/view` | `get_all_files`, `get_total_files`, `get_file_by_name` |
//! | GET    | `/transactions/by_hash/{hash}` | confirmation polling |
//!
//! Every call first checks that a usable module address is configured. When
//! it is not, the call fails with [`LedgerError::Unavailable`] and nothing is
//! sent over the network.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use fhv_core::{FileRecord, RecordName};

use crate::config::{LedgerConfig, ModuleAddress};
use crate::error::{classify_response, LedgerError};
use crate::signer::TransactionHandle;

#[derive(Serialize)]
struct ViewRequest {
    function: String,
    type_arguments: Vec<String>,
    arguments: Vec<Value>,
}

/// HTTP client for the ledger node.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    config: LedgerConfig,
}

impl LedgerClient {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LedgerError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Underlying HTTP client, shared with the wallet bridge.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The usable contract address, or `Unavailable`.
    pub fn module_address(&self) -> Result<&ModuleAddress, LedgerError> {
        self.config
            .usable_module_address()
            .ok_or_else(LedgerError::unconfigured)
    }

    /// Call a view function and return the result array.
    pub async fn view(&self, function: &str, arguments: Vec<Value>) -> Result<Vec<Value>, LedgerError> {
        let address = self.module_address()?;
        let endpoint = self.config.endpoint("view");
        let body = ViewRequest {
            function: address.function_id(function),
            type_arguments: Vec::new(),
            arguments,
        };
        tracing::debug!(function = %body.function, "calling view function");

        let resp = self
            .config
            .retry_policy()
            .read(&endpoint, || self.http.post(&endpoint).json(&body).send())
            .await
            .map_err(|source| LedgerError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_response(&endpoint, status.as_u16(), text));
        }
        resp.json::<Vec<Value>>().await.map_err(|e| LedgerError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }

    pub async fn get_all_files(&self) -> Result<Vec<FileRecord>, LedgerError> {
        let result = self.view("get_all_files", Vec::new()).await?;
        let entries = match result.into_iter().next() {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return Err(LedgerError::Decode {
                    endpoint: "get_all_files".into(),
                    reason: format!("expected an array of records, got {other}"),
                })
            }
        };
        let total = entries.len();
        let records: Vec<FileRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping undecodable ledger record");
                    None
                }
            })
            .collect();
        if records.len() < total {
            tracing::warn!(total, decoded = records.len(), "some ledger records were skipped");
        }
        Ok(records)
    }

    pub async fn get_total_files(&self) -> Result<u64, LedgerError> {
        let result = self.view("get_total_files", Vec::new()).await?;
        let decode_err = |reason: String| LedgerError::Decode {
            endpoint: "get_total_files".into(),
            reason,
        };
        match result.first() {
            Some(Value::String(s)) => s.trim().parse().map_err(|e| decode_err(format!("{s:?}: {e}"))),
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| decode_err(n.to_string())),
            other => Err(decode_err(format!("expected u64, got {other:?}"))),
        }
    }

    /// Record stored under `name`, or `None`.
    ///
    /// An empty result, `null`, or an `Option`-shaped `{"vec": []}` all mean
    /// absent.
    pub async fn get_file_by_name(&self, name: &RecordName) -> Result<Option<FileRecord>, LedgerError> {
        let result = self
            .view("get_file_by_name", vec![Value::String(name.as_str().to_string())])
            .await?;
        let value = match result.into_iter().next() {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(mut obj)) if obj.contains_key("vec") => {
                match obj.remove("vec") {
                    Some(Value::Array(items)) => match items.into_iter().next() {
                        Some(v) => v,
                        None => return Ok(None),
                    },
                    _ => return Ok(None),
                }
            }
            Some(v) => v,
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| LedgerError::Decode {
                endpoint: "get_file_by_name".into(),
                reason: e.to_string(),
            })
    }

    /// Poll until `tx` leaves the pending state.
    ///
    /// 404 and `pending_transaction` mean pending. `"success": false` is a
    /// rejection carrying the VM status verbatim.
    pub async fn wait_for_transaction(&self, tx: &TransactionHandle) -> Result<(), LedgerError> {
        self.module_address()?;
        let endpoint = self.config.endpoint(&format!("transactions/by_hash/{}", tx.hash));
        let poll = Duration::from_millis(self.config.confirmation_poll_ms);
        let budget = Duration::from_secs(self.config.confirmation_timeout_secs);
        let deadline = tokio::time::Instant::now() + budget;

        loop {
            let resp = self
                .config
                .retry_policy()
                .read(&endpoint, || self.http.get(&endpoint).send())
                .await
                .map_err(|source| LedgerError::Http {
                    endpoint: endpoint.clone(),
                    source,
                })?;
            let status = resp.status();
            if status.is_success() {
                let body: Value = resp.json().await.map_err(|e| LedgerError::Decode {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                })?;
                if body.get("type").and_then(Value::as_str) != Some("pending_transaction") {
                    return match body.get("success").and_then(Value::as_bool) {
                        Some(true) => {
                            tracing::debug!(tx = %tx, "transaction confirmed");
                            Ok(())
                        }
                        Some(false) => Err(LedgerError::Rejected {
                            reason: body
                                .get("vm_status")
                                .and_then(Value::as_str)
                                .unwrap_or("transaction failed")
                                .to_string(),
                        }),
                        None => Err(LedgerError::Decode {
                            endpoint,
                            reason: "committed transaction without success flag".into(),
                        }),
                    };
                }
            } else if status.as_u16() != 404 {
                let text = resp.text().await.unwrap_or_default();
                return Err(classify_response(&endpoint, status.as_u16(), text));
            }

            if tokio::time::Instant::now() + poll > deadline {
                return Err(LedgerError::ConfirmationTimeout {
                    hash: tx.hash.clone(),
                    waited_secs: budget.as_secs(),
                });
            }
            tokio::time::sleep(poll).await;
        }
    }
}
