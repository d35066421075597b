//! # Fake Ledger
//!
//! In-memory [`RecordStore`] that behaves like the deployed contract: records
//! are unique by name, writes need a signing session, and every successful
//! write issues a transaction hash. Failures are injected explicitly with
//! [`FakeLedger::fail_next()`], so tests are deterministic.
//!
//! Available with the `fake` feature (on by default).

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use fhv_core::{Author, CoreError, FailureKind, FileDigest, FileRecord, RecordName, Timestamp};
use fhv_store::{RecordStore, StoreError, StoreMode};

#[derive(Debug)]
struct FakeState {
    records: Vec<FileRecord>,
    account: Option<Author>,
    available: bool,
    fail_next: Option<FailureKind>,
    transactions: Vec<String>,
    view_calls: u64,
}

/// Deterministic in-memory ledger. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeLedger {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLedger {
    /// A deployed contract with a connected account.
    pub fn new() -> Self {
        Self::with_account(Some(Author::new("0xfa4e000000000000000000000000000000000000000000000000000000000001")))
    }

    /// A deployed contract; `None` means no signing session.
    pub fn with_account(account: Option<Author>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                records: Vec::new(),
                account,
                available: true,
                fail_next: None,
                transactions: Vec::new(),
                view_calls: 0,
            })),
        }
    }

    /// A ledger whose contract address is not configured.
    pub fn unconfigured() -> Self {
        let ledger = Self::new();
        ledger.state.lock().available = false;
        ledger
    }

    /// Make the next mutating call fail with `kind`.
    pub fn fail_next(&self, kind: FailureKind) {
        self.state.lock().fail_next = Some(kind);
    }

    /// Connect or disconnect the signing account.
    pub fn set_account(&self, account: Option<Author>) {
        self.state.lock().account = account;
    }

    /// Hashes of every committed transaction, oldest first.
    pub fn transactions(&self) -> Vec<String> {
        self.state.lock().transactions.clone()
    }

    /// Number of read calls served.
    pub fn view_calls(&self) -> u64 {
        self.state.lock().view_calls
    }

    fn read(&self) -> Result<Vec<FileRecord>, StoreError> {
        let mut state = self.state.lock();
        if !state.available {
            return Err(unavailable());
        }
        state.view_calls += 1;
        Ok(state.records.clone())
    }

    /// Run a write under the contract's preconditions and commit a transaction.
    fn write<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Vec<FileRecord>, &Author) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock();
        if !state.available {
            return Err(unavailable());
        }
        let account = state
            .account
            .clone()
            .ok_or_else(|| StoreError::AuthorizationMissing {
                operation: operation.to_string(),
            })?;
        if let Some(kind) = state.fail_next.take() {
            return Err(injected(kind, operation));
        }
        let out = f(&mut state.records, &account)?;
        let hash = format!("0x{:064x}", state.transactions.len() + 1);
        tracing::debug!(operation, tx = %hash, "fake ledger committed transaction");
        state.transactions.push(hash);
        Ok(out)
    }
}

fn unavailable() -> StoreError {
    StoreError::RemoteUnavailable {
        reason: "module address not configured".to_string(),
    }
}

fn injected(kind: FailureKind, operation: &str) -> StoreError {
    let reason = format!("injected failure during {operation}");
    match kind {
        FailureKind::AuthorizationMissing => StoreError::AuthorizationMissing {
            operation: operation.to_string(),
        },
        FailureKind::RemoteUnavailable => StoreError::RemoteUnavailable { reason },
        FailureKind::RemoteRejected => StoreError::RemoteRejected { reason },
        FailureKind::Network => StoreError::Network { reason },
        FailureKind::Storage => StoreError::Storage(reason),
        FailureKind::DigestComputationFailed => StoreError::Core(CoreError::Io(
            std::io::Error::new(std::io::ErrorKind::Other, reason),
        )),
        FailureKind::InvalidInput => StoreError::Core(CoreError::InvalidName(reason)),
    }
}

#[async_trait]
impl RecordStore for FakeLedger {
    fn mode(&self) -> StoreMode {
        StoreMode::Ledger
    }

    async fn list_all(&self) -> Result<Vec<FileRecord>, StoreError> {
        self.read()
    }

    async fn upsert_by_name(
        &self,
        name: &RecordName,
        digest: &FileDigest,
        _author: &Author,
    ) -> Result<FileRecord, StoreError> {
        self.write("store_file_hash", |records, account| {
            let now = Timestamp::now();
            match records.iter_mut().find(|r| r.name == *name) {
                Some(existing) => {
                    existing.replace_content(*digest, account.clone(), now);
                    Ok(existing.clone())
                }
                None => {
                    let record = FileRecord::new(name.clone(), *digest, account.clone(), now);
                    records.push(record.clone());
                    Ok(record)
                }
            }
        })
    }

    async fn record_verification(&self, record: &FileRecord) -> Result<FileRecord, StoreError> {
        self.write("verify_file_hash", |records, _| {
            let target = records
                .iter_mut()
                .find(|r| r.name == record.name && r.matches_digest(&record.digest))
                .ok_or_else(|| StoreError::RemoteRejected {
                    reason: format!("no record named {} with this hash", record.name),
                })?;
            target.record_verification();
            Ok(target.clone())
        })
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        Err(StoreError::Unsupported {
            operation: "clear_all".to_string(),
            mode: StoreMode::Ledger,
        })
    }

    fn last_transaction(&self) -> Option<String> {
        self.state.lock().transactions.last().cloned()
    }
}
