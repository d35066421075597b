//! # fhv-core — Foundational Types for the File Hash Verifier
//!
//! Defines the primitives every other crate in the workspace builds on.
//! It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Fixed-length digests.** `FileDigest` wraps exactly 32 bytes. A stored
//!    value of any other length cannot be decoded into one, so a corrupt
//!    record is rejected at the boundary instead of failing a comparison later.
//!
//! 2. **Content addressing.** Records are matched by `FileDigest` equality.
//!    Hex prefixes and letter case are normalized away at decode time, so all
//!    comparisons happen on raw bytes.
//!
//! 3. **Validated names.** `RecordName` rejects empty labels. `Author` carries
//!    a wallet address or the local placeholder.
//!
//! 4. **UTC-only timestamps** at seconds precision, stored as epoch seconds.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fhv-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod record;
pub mod temporal;

pub use digest::{
    sha256_digest, sha256_hex, sha256_reader, DigestBuilder, FileDigest, DIGEST_LEN, READ_CHUNK,
};
pub use error::{CoreError, FailureKind};
pub use identity::{Author, RecordName};
pub use record::FileRecord;
pub use temporal::Timestamp;
