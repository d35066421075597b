//! # Ledger Record Store
//!
//! [`RecordStore`] over the deployed contract. Reads are view calls; writes
//! are entry function transactions signed by the active [`SigningSession`],
//! each followed by a confirmation wait and a read-back of the record.
//!
//! ## Failure Order
//!
//! 1. No usable module address: `RemoteUnavailable`, no network call.
//! 2. Write without a signing session: `AuthorizationMissing`.
//! 3. Anything the node or wallet reports, classified by
//!    [`classify_response`](crate::error).

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use fhv_core::{Author, FileDigest, FileRecord, RecordName, Timestamp};
use fhv_store::{RecordStore, StoreError, StoreMode};

use crate::client::LedgerClient;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::signer::{EntryFunctionPayload, SigningSession, TransactionHandle, WalletBridgeSession};

/// Record store backed by the ledger contract.
pub struct LedgerRecordStore {
    client: LedgerClient,
    session: Option<Arc<dyn SigningSession>>,
    last_tx: Mutex<Option<TransactionHandle>>,
}

impl std::fmt::Debug for LedgerRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerRecordStore")
            .field("client", &self.client)
            .field("session", &self.session.as_ref().map(|s| s.account()))
            .finish()
    }
}

impl LedgerRecordStore {
    /// Read-only until a session is attached.
    pub fn new(client: LedgerClient) -> Self {
        Self {
            client,
            session: None,
            last_tx: Mutex::new(None),
        }
    }

    /// Build a client from `config` and, when a wallet bridge is configured
    /// alongside a usable address, connect a signing session through it.
    ///
    /// A bridge that cannot be reached or refuses the connection leaves the
    /// store read-only: reads still work and writes fail with
    /// `AuthorizationMissing`.
    pub async fn connect(config: LedgerConfig) -> Result<Self, LedgerError> {
        let bridge = config.wallet_bridge_url.clone();
        let token = config.wallet_token.clone();
        let retry = config.retry_policy();
        let client = LedgerClient::new(config)?;
        let store = Self::new(client);
        let Some(url) = bridge.filter(|_| store.client.module_address().is_ok()) else {
            return Ok(store);
        };
        let http = store.client.http().clone();
        match WalletBridgeSession::connect_with(http, url.clone(), token, retry).await {
            Ok(session) => Ok(store.with_session(Arc::new(session))),
            Err(e) => {
                tracing::warn!(bridge = %url, error = %e, "wallet bridge not connected; ledger store is read-only");
                Ok(store)
            }
        }
    }

    /// Whether writes can be signed.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn with_session(mut self, session: Arc<dyn SigningSession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn client(&self) -> &LedgerClient {
        &self.client
    }

    /// Sign, submit and confirm `function(name, digest)`.
    async fn submit(
        &self,
        function: &str,
        name: &RecordName,
        digest: &FileDigest,
    ) -> Result<(TransactionHandle, Author), LedgerError> {
        let address = self.client.module_address()?;
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| LedgerError::AuthorizationMissing {
                operation: function.to_string(),
            })?;
        let payload = EntryFunctionPayload::file_call(address, function, name, digest);
        let tx = session.sign_and_submit(&payload).await?;
        tracing::info!(function, name = %name, tx = %tx, "awaiting confirmation");
        self.client.wait_for_transaction(&tx).await?;
        *self.last_tx.lock() = Some(tx.clone());
        Ok((tx, session.account()))
    }
}

#[async_trait]
impl RecordStore for LedgerRecordStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Ledger
    }

    async fn list_all(&self) -> Result<Vec<FileRecord>, StoreError> {
        Ok(self.client.get_all_files().await?)
    }

    async fn upsert_by_name(
        &self,
        name: &RecordName,
        digest: &FileDigest,
        _author: &Author,
    ) -> Result<FileRecord, StoreError> {
        let (tx, account) = self.submit("store_file_hash", name, digest).await?;
        let record = match self.client.get_file_by_name(name).await? {
            Some(record) => record,
            None => {
                tracing::warn!(name = %name, tx = %tx, "stored record not visible yet; using submitted values");
                FileRecord::new(name.clone(), *digest, account, Timestamp::now())
            }
        };
        tracing::info!(name = %record.name, tx = %tx, "stored record on ledger");
        Ok(record)
    }

    async fn record_verification(&self, record: &FileRecord) -> Result<FileRecord, StoreError> {
        let (tx, _) = self
            .submit("verify_file_hash", &record.name, &record.digest)
            .await?;
        let updated = match self.client.get_file_by_name(&record.name).await? {
            Some(r) => r,
            None => {
                let mut r = record.clone();
                r.record_verification();
                r
            }
        };
        tracing::info!(name = %updated.name, count = updated.verification_count, tx = %tx, "recorded verification on ledger");
        Ok(updated)
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        Err(StoreError::Unsupported {
            operation: "clear_all".to_string(),
            mode: StoreMode::Ledger,
        })
    }

    async fn find_by_name(&self, name: &RecordName) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.client.get_file_by_name(name).await?)
    }

    async fn total_records(&self) -> Result<u64, StoreError> {
        Ok(self.client.get_total_files().await?)
    }

    fn last_transaction(&self) -> Option<String> {
        self.last_tx.lock().as_ref().map(|tx| tx.hash.clone())
    }
}
