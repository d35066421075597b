//! # Verification Workflow
//!
//! Drives store and verify operations against an injected
//! [`RecordStore`]. Written once against the trait; the local and ledger
//! variants are interchangeable.
//!
//! ## Exclusivity
//!
//! Operations take `&mut self`. One instance runs at most one operation at a
//! time; callers that want parallel work construct more instances.
//!
//! ## Events
//!
//! Every phase change and store switch is published on a `watch` channel as a
//! [`WorkflowEvent`]. Subscribers see the latest event; the full sequence of
//! the last operation is available from [`VerificationWorkflow::store_trail()`]
//! and [`VerificationWorkflow::verify_trail()`].

use std::sync::Arc;

use tokio::sync::watch;

use fhv_core::{Author, FailureKind, RecordName};
use fhv_store::{
    ActivityEntry, ActivityKind, ActivityRecorder, ActivityStatus, RecordStore, StoreMode,
};

use crate::input::FileInput;
use crate::outcome::{StoreOutcome, VerificationOutcome, WorkflowFailure};
use crate::state::{OperationKind, PhaseMachine, StorePhase, VerifyPhase, WorkflowError};

/// Published on every phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    Store(StorePhase),
    Verify(VerifyPhase),
    /// A different record store was injected.
    ModeChanged(StoreMode),
}

/// Orchestrates store and verify against one record store.
pub struct VerificationWorkflow {
    store: Arc<dyn RecordStore>,
    author: Author,
    activity: Option<Arc<dyn ActivityRecorder>>,
    store_phase: PhaseMachine<StorePhase>,
    verify_phase: PhaseMachine<VerifyPhase>,
    events: watch::Sender<WorkflowEvent>,
}

impl std::fmt::Debug for VerificationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationWorkflow")
            .field("mode", &self.store.mode())
            .field("author", &self.author)
            .field("store_phase", &self.store_phase.state())
            .field("verify_phase", &self.verify_phase.state())
            .finish()
    }
}

impl VerificationWorkflow {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let (events, _) = watch::channel(WorkflowEvent::ModeChanged(store.mode()));
        Self {
            store,
            author: Author::placeholder(),
            activity: None,
            store_phase: PhaseMachine::new(),
            verify_phase: PhaseMachine::new(),
            events,
        }
    }

    /// Author recorded by stores that take one from the caller.
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    /// Report every terminal state to `activity`.
    pub fn with_activity(mut self, activity: Arc<dyn ActivityRecorder>) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn mode(&self) -> StoreMode {
        self.store.mode()
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Swap the record store, e.g. fall back to local after `RemoteUnavailable`.
    pub fn switch_store(&mut self, store: Arc<dyn RecordStore>) {
        let mode = store.mode();
        self.store = store;
        tracing::info!(%mode, "record store switched");
        self.events.send_replace(WorkflowEvent::ModeChanged(mode));
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn store_phase(&self) -> StorePhase {
        self.store_phase.state()
    }

    pub fn verify_phase(&self) -> VerifyPhase {
        self.verify_phase.state()
    }

    /// Phases of the most recent store operation.
    pub fn store_trail(&self) -> &[StorePhase] {
        self.store_phase.trail()
    }

    /// Phases of the most recent verify operation.
    pub fn verify_trail(&self) -> &[VerifyPhase] {
        self.verify_phase.trail()
    }

    // ── Store ────────────────────────────────────────────────────────

    /// Hash `input` and upsert it under `name`, or under the input's display
    /// name when `name` is `None`.
    pub async fn store_file(
        &mut self,
        input: FileInput,
        name: Option<&str>,
    ) -> Result<StoreOutcome, WorkflowFailure> {
        if let Some(abandoned) = self.store_phase.reset() {
            tracing::warn!(phase = %abandoned, "previous store was interrupted; resetting");
            self.events.send_replace(WorkflowEvent::Store(StorePhase::Idle));
        }
        let label = name.map(str::to_string).unwrap_or_else(|| input.display_name());
        let record_name = match RecordName::new(&label) {
            Ok(n) => n,
            Err(e) => {
                let failure = WorkflowFailure::from(e);
                self.finish(OperationKind::Store, &label, Err(&failure), None);
                return Err(failure);
            }
        };

        self.advance_store(StorePhase::HashingInProgress)?;
        let digest = match input.digest().await {
            Ok(d) => d,
            Err(e) => {
                let failure = WorkflowFailure::from(e);
                tracing::warn!(name = %record_name, error = %failure.detail, "hashing failed");
                self.advance_store(StorePhase::Idle)?;
                self.finish(OperationKind::Store, &label, Err(&failure), None);
                return Err(failure);
            }
        };

        // Only feeds the "replaced" flag; the upsert decides success.
        let existed = match self.store.find_by_name(&record_name).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::debug!(name = %record_name, error = %e, "existing-record lookup failed");
                false
            }
        };
        let record = match self.store.upsert_by_name(&record_name, &digest, &self.author).await {
            Ok(r) => r,
            Err(e) => return self.fail_store(&label, e.into()),
        };

        self.advance_store(StorePhase::RecordPersisted)?;
        let tx = self.store.last_transaction().filter(|_| self.mode() == StoreMode::Ledger);
        let outcome = StoreOutcome::new(record, existed, self.mode(), tx);
        tracing::info!(
            name = %outcome.record.name,
            digest = %outcome.record.digest.short_hex(16),
            replaced = outcome.replaced,
            mode = %outcome.mode,
            "file stored"
        );
        self.finish(
            OperationKind::Store,
            &label,
            Ok(&outcome.message),
            outcome.transaction.as_deref(),
        );
        self.advance_store(StorePhase::Idle)?;
        Ok(outcome)
    }

    fn fail_store(
        &mut self,
        label: &str,
        failure: WorkflowFailure,
    ) -> Result<StoreOutcome, WorkflowFailure> {
        tracing::warn!(name = label, kind = %failure.kind, error = %failure.detail, "store failed");
        self.advance_store(StorePhase::PersistFailed)?;
        self.finish(OperationKind::Store, label, Err(&failure), None);
        self.advance_store(StorePhase::Idle)?;
        Err(failure)
    }

    // ── Verify ───────────────────────────────────────────────────────

    /// Hash `input` and look the digest up by content.
    ///
    /// A match increments the record's verification count. If recording the
    /// count fails, the outcome is still a match and carries the failure,
    /// unless the store has no signing session: that is reported as
    /// `AuthorizationMissing` and ends in `LookupFailed`.
    ///
    /// A verify whose future was dropped before finishing leaves its phase
    /// behind; the next call resets it to idle first.
    pub async fn verify_file(&mut self, input: FileInput) -> Result<VerificationOutcome, WorkflowFailure> {
        if let Some(abandoned) = self.verify_phase.reset() {
            tracing::warn!(phase = %abandoned, "previous verify was interrupted; resetting");
            self.events.send_replace(WorkflowEvent::Verify(VerifyPhase::Idle));
        }
        let candidate = input.display_name();

        self.advance_verify(VerifyPhase::HashingInProgress)?;
        let digest = match input.digest().await {
            Ok(d) => d,
            Err(e) => {
                let failure = WorkflowFailure::from(e);
                tracing::warn!(name = %candidate, error = %failure.detail, "hashing failed");
                self.advance_verify(VerifyPhase::Idle)?;
                self.finish(OperationKind::Verify, &candidate, Err(&failure), None);
                return Err(failure);
            }
        };

        self.advance_verify(VerifyPhase::LookupInProgress)?;
        let found = match self.store.find_by_digest(&digest).await {
            Ok(found) => found,
            Err(e) => {
                let failure = WorkflowFailure::from(e);
                tracing::warn!(name = %candidate, kind = %failure.kind, error = %failure.detail, "lookup failed");
                self.advance_verify(VerifyPhase::LookupFailed)?;
                self.finish(OperationKind::Verify, &candidate, Err(&failure), None);
                self.advance_verify(VerifyPhase::Idle)?;
                return Err(failure);
            }
        };

        let outcome = match found {
            None => {
                self.advance_verify(VerifyPhase::NotMatched)?;
                VerificationOutcome::not_matched(candidate.clone(), digest, self.mode())
            }
            Some(record) => match self.store.record_verification(&record).await {
                Ok(updated) => {
                    self.advance_verify(VerifyPhase::Matched)?;
                    let tx = self.store.last_transaction().filter(|_| self.mode() == StoreMode::Ledger);
                    VerificationOutcome::matched(candidate.clone(), digest, updated, self.mode(), tx, None)
                }
                Err(e) => {
                    let failure = WorkflowFailure::from(e);
                    if failure.kind == FailureKind::AuthorizationMissing {
                        // Without a signer the count can never be recorded.
                        tracing::warn!(name = %record.name, "match found but no signing session");
                        self.advance_verify(VerifyPhase::LookupFailed)?;
                        self.finish(OperationKind::Verify, &candidate, Err(&failure), None);
                        self.advance_verify(VerifyPhase::Idle)?;
                        return Err(failure);
                    }
                    tracing::warn!(name = %record.name, kind = %failure.kind, "verification matched but was not recorded");
                    self.advance_verify(VerifyPhase::Matched)?;
                    VerificationOutcome::matched(candidate.clone(), digest, record, self.mode(), None, Some(failure))
                }
            },
        };

        tracing::info!(
            candidate = %outcome.candidate_name,
            matched = outcome.matched,
            original = ?outcome.original_name().map(RecordName::as_str),
            "verification finished"
        );
        self.finish(
            OperationKind::Verify,
            &candidate,
            Ok(&outcome.message),
            outcome.transaction.as_deref(),
        );
        self.advance_verify(VerifyPhase::Idle)?;
        Ok(outcome)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn advance_store(&mut self, next: StorePhase) -> Result<(), WorkflowFailure> {
        self.store_phase.advance(next).map_err(internal)?;
        self.events.send_replace(WorkflowEvent::Store(next));
        Ok(())
    }

    fn advance_verify(&mut self, next: VerifyPhase) -> Result<(), WorkflowFailure> {
        self.verify_phase.advance(next).map_err(internal)?;
        self.events.send_replace(WorkflowEvent::Verify(next));
        Ok(())
    }

    /// Count the terminal state and append it to the activity log.
    fn finish(
        &self,
        operation: OperationKind,
        name: &str,
        result: Result<&String, &WorkflowFailure>,
        transaction: Option<&str>,
    ) {
        let outcome = match result {
            Ok(_) => "success",
            Err(f) => f.kind.as_str(),
        };
        metrics::counter!(
            "fhv_operations_total",
            "operation" => operation.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        let Some(activity) = &self.activity else {
            return;
        };
        let kind = match operation {
            OperationKind::Store => ActivityKind::Store,
            OperationKind::Verify => ActivityKind::Verify,
        };
        let (status, detail) = match result {
            Ok(message) => (ActivityStatus::Success, message.clone()),
            Err(f) => (ActivityStatus::Failed, f.message.clone()),
        };
        let mut entry = ActivityEntry::new(kind, name, status, self.mode()).with_detail(detail);
        if let Some(tx) = transaction {
            entry = entry.with_transaction(tx);
        }
        if let Err(e) = activity.record(entry) {
            tracing::warn!(error = %e, "could not append to activity log");
        }
    }
}

fn internal(e: WorkflowError) -> WorkflowFailure {
    WorkflowFailure::new(FailureKind::InvalidInput, e.to_string())
}
