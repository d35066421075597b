//! # Record Subcommands
//!
//! Read-only views over the configured store and the local activity log,
//! plus `clear` for the local store.

use anyhow::{bail, Result};
use clap::Args;
use serde_json::json;

use fhv_core::{FileRecord, RecordName, Timestamp};
use fhv_store::{growth_percentage, ActivityEntry, ActivityKind, ActivityStatus, StoreStats};

use crate::app::App;
use crate::{EXIT_FAILURE, EXIT_OK};

const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

/// Arguments for `fhv show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Record name.
    pub name: String,
}

/// Arguments for `fhv history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Show at most this many entries, newest first.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

/// Arguments for `fhv clear`.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Also clear the activity log.
    #[arg(long)]
    pub history: bool,
}

pub async fn run_list(app: &App) -> Result<u8> {
    let store = app.record_store().await?;
    let records = store.list_all().await?;
    if app.json() {
        app.print_json(&records)?;
        return Ok(EXIT_OK);
    }
    if records.is_empty() {
        println!("No files stored yet.");
        return Ok(EXIT_OK);
    }
    println!(
        "{:<32} {:<18} {:<16} {:<10} {:>8}",
        "NAME", "DIGEST", "AUTHOR", "STORED", "VERIFIED"
    );
    for r in &records {
        println!(
            "{:<32} {:<18} {:<16} {:<10} {:>8}",
            r.name.as_str(),
            r.digest.short_hex(16),
            r.author.abbreviated(),
            r.stored_at.date_label(),
            r.verification_count
        );
    }
    Ok(EXIT_OK)
}

pub async fn run_show(args: &ShowArgs, app: &App) -> Result<u8> {
    let name = RecordName::new(&args.name)?;
    let store = app.record_store().await?;
    let Some(record) = store.find_by_name(&name).await? else {
        eprintln!("error: no record named {name}");
        return Ok(EXIT_FAILURE);
    };
    if app.json() {
        app.print_json(&record)?;
    } else {
        print_record(&record);
    }
    Ok(EXIT_OK)
}

fn print_record(record: &FileRecord) {
    println!("name:          {}", record.name);
    println!("digest:        {}", record.digest);
    println!("author:        {}", record.author);
    println!("stored_at:     {}", record.stored_at);
    println!("verifications: {}", record.verification_count);
}

pub async fn run_stats(app: &App) -> Result<u8> {
    let store = app.record_store().await?;
    let records = store.list_all().await?;
    let activity = app.activity()?.entries();
    let stats = StoreStats::from_records(&records, &activity);
    let (this_week, last_week) = weekly_stores(&activity, Timestamp::now());
    let growth = growth_percentage(this_week, last_week);

    if app.json() {
        app.print_json(&json!({
            "mode": store.mode(),
            "stats": stats,
            "stores_this_week": this_week,
            "weekly_growth": growth,
        }))?;
        return Ok(EXIT_OK);
    }
    println!("mode:                  {}", store.mode());
    println!("files:                 {}", stats.total_files);
    println!("verifications:         {}", stats.total_verifications);
    println!("avg per file:          {:.1}", stats.average_verifications_per_file);
    println!("success rate:          {}%", stats.success_rate);
    println!("stores this week:      {this_week} ({growth})");
    Ok(EXIT_OK)
}

/// Successful stores in the last seven days and in the seven days before.
fn weekly_stores(activity: &[ActivityEntry], now: Timestamp) -> (u64, u64) {
    let now = now.epoch_secs();
    activity
        .iter()
        .filter(|e| e.kind == ActivityKind::Store && e.status == ActivityStatus::Success)
        .fold((0, 0), |(this, last), e| {
            let age = now - e.timestamp.epoch_secs();
            if (0..WEEK_SECS).contains(&age) {
                (this + 1, last)
            } else if (WEEK_SECS..2 * WEEK_SECS).contains(&age) {
                (this, last + 1)
            } else {
                (this, last)
            }
        })
}

pub async fn run_history(args: &HistoryArgs, app: &App) -> Result<u8> {
    let mut entries = app.activity()?.entries();
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    if app.json() {
        app.print_json(&entries)?;
        return Ok(EXIT_OK);
    }
    if entries.is_empty() {
        println!("No activity yet.");
        return Ok(EXIT_OK);
    }
    for e in &entries {
        let kind = match e.kind {
            ActivityKind::Store => "store",
            ActivityKind::Verify => "verify",
        };
        let status = match e.status {
            ActivityStatus::Success => "ok",
            ActivityStatus::Failed => "failed",
        };
        print!("{}  {kind:<6}  {status:<6}  {:<6}  {}", e.timestamp, e.mode.as_str(), e.name);
        match &e.transaction {
            Some(tx) => println!("  tx={tx}"),
            None => println!(),
        }
    }
    Ok(EXIT_OK)
}

pub async fn run_clear(args: &ClearArgs, app: &App) -> Result<u8> {
    let store = app.record_store().await?;
    let removed = store.total_records().await?;
    if let Err(e) = store.clear_all().await {
        bail!("cannot clear records in {} mode: {e}", store.mode());
    }
    if args.history {
        app.activity()?.clear()?;
    }
    tracing::info!(removed, "records cleared");
    if app.json() {
        app.print_json(&json!({ "removed": removed, "history_cleared": args.history }))?;
    } else {
        println!("Cleared {removed} record(s).");
    }
    Ok(EXIT_OK)
}
