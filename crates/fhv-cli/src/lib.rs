//! # fhv-cli — File Hash Verifier Command Line
//!
//! Provides the `fhv` binary over the verification workflow.
//!
//! ## Subcommands
//!
//! - `fhv hash <file>`: print the SHA-256 digest.
//! - `fhv store <file> [--name <name>]`: record the digest.
//! - `fhv verify <file>`: check a file against stored records.
//! - `fhv list`, `fhv show <name>`, `fhv stats`, `fhv history`.
//! - `fhv clear`: remove all local records.
//!
//! ```bash
//! fhv store contract.pdf
//! fhv verify ~/Downloads/contract-copy.pdf
//! FHV_MODULE_ADDRESS=0xabc... fhv --mode ledger verify contract.pdf
//! ```
//!
//! ## Exit Codes
//!
//! `0` success or match, `2` no match, `1` any failure.

pub mod app;
pub mod config;
pub mod files;
pub mod records;

pub use app::App;
pub use config::AppConfig;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_MATCHED: u8 = 2;
