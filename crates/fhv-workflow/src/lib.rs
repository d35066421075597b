//! # fhv-workflow — Store and Verify Workflows
//!
//! The user-facing operations of the File Hash Verifier, written once
//! against [`RecordStore`](fhv_store::RecordStore):
//!
//! - **Store**: hash a file and upsert its digest under a name.
//! - **Verify**: hash a file and look its digest up by content. A match
//!   increments the matched record's verification count.
//!
//! Matching keys on the digest, never the name, so a renamed copy of stored
//! content verifies as authentic and a modified file under the original name
//! does not.
//!
//! ## Outcomes
//!
//! Operations return `Result<_, WorkflowFailure>`. Every store error is
//! converted into a tagged [`WorkflowFailure`] before it leaves this crate.
//!
//! ## Crate Policy
//!
//! - Depends on `fhv-core` and `fhv-store`; the ledger variant is injected.
//! - No global state. The record store is passed in by the caller.

pub mod input;
pub mod outcome;
pub mod state;
pub mod workflow;

pub use input::{digest_file, FileInput};
pub use outcome::{StoreOutcome, VerificationOutcome, WorkflowFailure};
pub use state::{OperationKind, Phase, PhaseMachine, StorePhase, VerifyPhase, WorkflowError};
pub use workflow::{VerificationWorkflow, WorkflowEvent};
