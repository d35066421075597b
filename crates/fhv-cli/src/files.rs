//! # File Subcommands
//!
//! - `fhv hash <file>`: print the SHA-256 digest.
//! - `fhv store <file> [--name <name>]`: record the digest.
//! - `fhv verify <file>`: check the digest against stored records.
//!
//! `verify` exits 0 on a match, 2 when nothing matches, 1 on failure.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use fhv_workflow::{digest_file, FileInput, VerificationOutcome, WorkflowFailure};

use crate::app::App;
use crate::{EXIT_FAILURE, EXIT_NOT_MATCHED, EXIT_OK};

/// Arguments for `fhv hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash.
    pub file: PathBuf,
}

/// Arguments for `fhv store`.
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// File to store.
    pub file: PathBuf,

    /// Record name. Defaults to the file name.
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for `fhv verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// File to check.
    pub file: PathBuf,
}

pub async fn run_hash(args: &HashArgs, app: &App) -> Result<u8> {
    let digest = digest_file(&args.file)
        .await
        .with_context(|| format!("failed to hash {}", args.file.display()))?;
    if app.json() {
        app.print_json(&json!({ "file": args.file, "digest": digest }))?;
    } else {
        println!("{}  {}", digest, args.file.display());
    }
    Ok(EXIT_OK)
}

pub async fn run_store(args: &StoreArgs, app: &App) -> Result<u8> {
    let mut workflow = app.workflow().await?;
    let outcome = match workflow
        .store_file(FileInput::path(&args.file), args.name.as_deref())
        .await
    {
        Ok(o) => o,
        Err(failure) => return report_failure(&failure, app),
    };

    if app.json() {
        app.print_json(&outcome)?;
        return Ok(EXIT_OK);
    }
    println!("{}", outcome.message);
    println!("  name:      {}", outcome.record.name);
    println!("  digest:    {}", outcome.record.digest);
    println!("  author:    {}", outcome.record.author);
    println!("  stored_at: {}", outcome.record.stored_at);
    if let Some(tx) = &outcome.transaction {
        println!("  tx:        {tx}");
    }
    Ok(EXIT_OK)
}

pub async fn run_verify(args: &VerifyArgs, app: &App) -> Result<u8> {
    let mut workflow = app.workflow().await?;
    let outcome = match workflow.verify_file(FileInput::path(&args.file)).await {
        Ok(o) => o,
        Err(failure) => return report_failure(&failure, app),
    };

    let code = if outcome.matched {
        EXIT_OK
    } else {
        EXIT_NOT_MATCHED
    };
    if app.json() {
        app.print_json(&outcome)?;
    } else {
        print_verification(&outcome);
    }
    Ok(code)
}

fn print_verification(outcome: &VerificationOutcome) {
    let verdict = if outcome.matched { "MATCH" } else { "NO MATCH" };
    println!("{verdict}: {}", outcome.message);
    println!("  file:          {}", outcome.candidate_name);
    println!("  digest:        {}", outcome.digest);
    if let Some(record) = &outcome.record {
        println!("  original name: {}", record.name);
        println!("  author:        {}", record.author);
        println!("  stored:        {}", record.stored_at.date_label());
        println!("  verifications: {}", record.verification_count);
    }
    if let Some(tx) = &outcome.transaction {
        println!("  tx:            {tx}");
    }
    if let Some(failure) = &outcome.recording_failure {
        eprintln!("warning: {}", failure.detail);
    }
}

/// Print a workflow failure and pick the exit code.
fn report_failure(failure: &WorkflowFailure, app: &App) -> Result<u8> {
    tracing::debug!(kind = %failure.kind, detail = %failure.detail, "operation failed");
    if app.json() {
        app.print_json(failure)?;
    } else {
        eprintln!("error: {}", failure.message);
        if failure.suggests_local_fallback() {
            eprintln!("hint: rerun with --mode local to use the local store");
        }
    }
    Ok(EXIT_FAILURE)
}
