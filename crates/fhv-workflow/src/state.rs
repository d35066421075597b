//! # Operation State Machines
//!
//! ## Store
//!
//! ```text
//! Idle ──▶ HashingInProgress ──▶ RecordPersisted ──▶ Idle
//!                 │         └──▶ PersistFailed   ──▶ Idle
//!                 └──▶ Idle (digest failed)
//! ```
//!
//! ## Verify
//!
//! ```text
//! Idle ──▶ HashingInProgress ──▶ LookupInProgress ──▶ Matched      ──▶ Idle
//!                 │                           ├──▶ NotMatched   ──▶ Idle
//!                 │                           └──▶ LookupFailed ──▶ Idle
//!                 └──▶ Idle (digest failed)
//! ```
//!
//! Every transition goes through [`PhaseMachine::advance()`], which rejects
//! anything not drawn above.

use serde::Serialize;
use thiserror::Error;

/// Which operation a phase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Store,
    Verify,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Verify => "verify",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Phases ──────────────────────────────────────────────────────────

/// A state in one operation's lifecycle.
pub trait Phase: Copy + Eq + std::fmt::Debug + std::fmt::Display {
    const IDLE: Self;
    const OPERATION: OperationKind;

    /// Whether `self → next` is a legal transition.
    fn allows(self, next: Self) -> bool;

    /// Terminal phases hold the operation's result until reset to idle.
    fn is_terminal(self) -> bool;
}

/// Lifecycle of a store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StorePhase {
    Idle,
    HashingInProgress,
    RecordPersisted,
    PersistFailed,
}

impl Phase for StorePhase {
    const IDLE: Self = Self::Idle;
    const OPERATION: OperationKind = OperationKind::Store;

    fn allows(self, next: Self) -> bool {
        use StorePhase::*;
        matches!(
            (self, next),
            (Idle, HashingInProgress)
                | (HashingInProgress, RecordPersisted)
                | (HashingInProgress, PersistFailed)
                | (HashingInProgress, Idle)
                | (RecordPersisted, Idle)
                | (PersistFailed, Idle)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::RecordPersisted | Self::PersistFailed)
    }
}

impl std::fmt::Display for StorePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::HashingInProgress => "HASHING",
            Self::RecordPersisted => "PERSISTED",
            Self::PersistFailed => "PERSIST_FAILED",
        };
        f.write_str(s)
    }
}

/// Lifecycle of a verify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VerifyPhase {
    Idle,
    HashingInProgress,
    LookupInProgress,
    Matched,
    NotMatched,
    LookupFailed,
}

impl Phase for VerifyPhase {
    const IDLE: Self = Self::Idle;
    const OPERATION: OperationKind = OperationKind::Verify;

    fn allows(self, next: Self) -> bool {
        use VerifyPhase::*;
        matches!(
            (self, next),
            (Idle, HashingInProgress)
                | (HashingInProgress, LookupInProgress)
                | (HashingInProgress, Idle)
                | (LookupInProgress, Matched)
                | (LookupInProgress, NotMatched)
                | (LookupInProgress, LookupFailed)
                | (Matched, Idle)
                | (NotMatched, Idle)
                | (LookupFailed, Idle)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Matched | Self::NotMatched | Self::LookupFailed)
    }
}

impl std::fmt::Display for VerifyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::HashingInProgress => "HASHING",
            Self::LookupInProgress => "LOOKUP",
            Self::Matched => "MATCHED",
            Self::NotMatched => "NOT_MATCHED",
            Self::LookupFailed => "LOOKUP_FAILED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by the state machines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("invalid {operation} transition: {from} -> {to}")]
    InvalidTransition {
        operation: OperationKind,
        from: String,
        to: String,
    },
}

// ─── Machine ─────────────────────────────────────────────────────────

/// Current phase plus the trail of phases visited since the last reset.
#[derive(Debug, Clone)]
pub struct PhaseMachine<P: Phase> {
    state: P,
    trail: Vec<P>,
}

impl<P: Phase> Default for PhaseMachine<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Phase> PhaseMachine<P> {
    pub fn new() -> Self {
        Self {
            state: P::IDLE,
            trail: vec![P::IDLE],
        }
    }

    pub fn state(&self) -> P {
        self.state
    }

    /// Phases visited since the operation started, beginning with idle.
    pub fn trail(&self) -> &[P] {
        &self.trail
    }

    pub fn advance(&mut self, next: P) -> Result<(), WorkflowError> {
        if !self.state.allows(next) {
            return Err(WorkflowError::InvalidTransition {
                operation: P::OPERATION,
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        if self.state == P::IDLE {
            self.trail.clear();
            self.trail.push(P::IDLE);
        }
        self.state = next;
        self.trail.push(next);
        Ok(())
    }

    /// Return to idle from wherever the machine stopped, e.g. after the
    /// future driving an operation was dropped mid-flight. Yields the phase
    /// that was abandoned, or `None` if the machine was already idle.
    pub fn reset(&mut self) -> Option<P> {
        if self.state == P::IDLE {
            return None;
        }
        let abandoned = self.state;
        self.state = P::IDLE;
        self.trail.clear();
        self.trail.push(P::IDLE);
        Some(abandoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_happy_path() {
        let mut m = PhaseMachine::<StorePhase>::new();
        m.advance(StorePhase::HashingInProgress).unwrap();
        m.advance(StorePhase::RecordPersisted).unwrap();
        assert!(m.state().is_terminal());
        m.advance(StorePhase::Idle).unwrap();
        assert_eq!(
            m.trail(),
            &[
                StorePhase::Idle,
                StorePhase::HashingInProgress,
                StorePhase::RecordPersisted,
                StorePhase::Idle
            ]
        );
    }

    #[test]
    fn store_cannot_skip_hashing() {
        let mut m = PhaseMachine::<StorePhase>::new();
        let err = m.advance(StorePhase::RecordPersisted).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid store transition: IDLE -> PERSISTED"
        );
        assert_eq!(m.state(), StorePhase::Idle);
    }

    #[test]
    fn verify_requires_lookup_before_result() {
        let mut m = PhaseMachine::<VerifyPhase>::new();
        m.advance(VerifyPhase::HashingInProgress).unwrap();
        assert!(m.advance(VerifyPhase::Matched).is_err());
        m.advance(VerifyPhase::LookupInProgress).unwrap();
        m.advance(VerifyPhase::NotMatched).unwrap();
        assert!(m.advance(VerifyPhase::Matched).is_err());
        m.advance(VerifyPhase::Idle).unwrap();
    }

    #[test]
    fn hashing_can_abort_to_idle() {
        let mut m = PhaseMachine::<VerifyPhase>::new();
        m.advance(VerifyPhase::HashingInProgress).unwrap();
        m.advance(VerifyPhase::Idle).unwrap();
        assert_eq!(m.state(), VerifyPhase::Idle);
    }

    #[test]
    fn reset_recovers_an_abandoned_operation() {
        let mut m = PhaseMachine::<VerifyPhase>::new();
        assert_eq!(m.reset(), None);
        m.advance(VerifyPhase::HashingInProgress).unwrap();
        m.advance(VerifyPhase::LookupInProgress).unwrap();

        assert_eq!(m.reset(), Some(VerifyPhase::LookupInProgress));
        assert_eq!(m.state(), VerifyPhase::Idle);
        assert_eq!(m.trail(), &[VerifyPhase::Idle]);
        m.advance(VerifyPhase::HashingInProgress).unwrap();
    }

    #[test]
    fn trail_restarts_with_each_operation() {
        let mut m = PhaseMachine::<StorePhase>::new();
        for terminal in [StorePhase::PersistFailed, StorePhase::RecordPersisted] {
            m.advance(StorePhase::HashingInProgress).unwrap();
            m.advance(terminal).unwrap();
            m.advance(StorePhase::Idle).unwrap();
        }
        assert_eq!(m.trail().len(), 4);
        assert_eq!(m.trail()[2], StorePhase::RecordPersisted);
    }
}
