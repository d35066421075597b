//! Resolved configuration plus constructors for the stores it selects.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use fhv_core::Author;
use fhv_ledger::LedgerRecordStore;
use fhv_store::{ActivityLog, FileKeyValueStore, LocalRecordStore, RecordStore, StoreMode};
use fhv_workflow::VerificationWorkflow;

use crate::config::AppConfig;

/// Shared state handed to every subcommand.
#[derive(Debug, Clone)]
pub struct App {
    config: AppConfig,
    json: bool,
}

impl App {
    pub fn new(config: AppConfig, json: bool) -> Self {
        Self { config, json }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Whether output should be JSON instead of text.
    pub fn json(&self) -> bool {
        self.json
    }

    fn data_kv(&self) -> FileKeyValueStore {
        FileKeyValueStore::new(&self.config.data_dir)
    }

    /// The activity log under the data directory. Kept locally in both modes.
    pub fn activity(&self) -> Result<Arc<ActivityLog<FileKeyValueStore>>> {
        let log = ActivityLog::open(self.data_kv()).with_context(|| {
            format!(
                "failed to open activity log in {}",
                self.config.data_dir.display()
            )
        })?;
        Ok(Arc::new(log))
    }

    /// The record store selected by `mode`.
    pub async fn record_store(&self) -> Result<Arc<dyn RecordStore>> {
        match self.config.mode {
            StoreMode::Local => {
                let store = LocalRecordStore::open(self.data_kv()).with_context(|| {
                    format!(
                        "failed to open local records in {}",
                        self.config.data_dir.display()
                    )
                })?;
                tracing::debug!(dir = %self.config.data_dir.display(), "opened local record store");
                Ok(Arc::new(store))
            }
            StoreMode::Ledger => {
                let ledger = self.config.ledger_config()?;
                tracing::debug!(config = ?ledger, "connecting to ledger");
                let store = LedgerRecordStore::connect(ledger)
                    .await
                    .context("failed to set up the ledger record store")?;
                Ok(Arc::new(store))
            }
        }
    }

    /// A workflow over the configured store that logs to the activity log.
    pub async fn workflow(&self) -> Result<VerificationWorkflow> {
        let store = self.record_store().await?;
        let activity = self.activity()?;
        Ok(VerificationWorkflow::new(store)
            .with_author(Author::placeholder())
            .with_activity(activity))
    }

    /// Print `value` as pretty JSON on stdout.
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
