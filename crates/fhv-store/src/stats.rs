//! Aggregate statistics over a record set and its activity log.

use serde::Serialize;

use fhv_core::FileRecord;

use crate::activity::{ActivityEntry, ActivityStatus};

/// Summary numbers shown by `fhv stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_files: u64,
    /// Sum of every record's verification count.
    pub total_verifications: u64,
    /// `total_verifications / total_files`, rounded to one decimal.
    pub average_verifications_per_file: f64,
    /// Percentage of successful attempts in the activity log, rounded to a
    /// whole number. 100 when the log is empty.
    pub success_rate: u32,
}

impl StoreStats {
    pub fn from_records(records: &[FileRecord], activity: &[ActivityEntry]) -> Self {
        let total_files = records.len() as u64;
        let total_verifications = records
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.verification_count));
        let average_verifications_per_file = if total_files == 0 {
            0.0
        } else {
            (total_verifications as f64 / total_files as f64 * 10.0).round() / 10.0
        };
        let success_rate = if activity.is_empty() {
            100
        } else {
            let ok = activity
                .iter()
                .filter(|e| e.status == ActivityStatus::Success)
                .count();
            (ok as f64 / activity.len() as f64 * 100.0).round() as u32
        };
        Self {
            total_files,
            total_verifications,
            average_verifications_per_file,
            success_rate,
        }
    }
}

/// Signed percentage change from `previous` to `current`, one decimal place.
///
/// `previous == 0` is reported as `+100%`.
pub fn growth_percentage(current: u64, previous: u64) -> String {
    if previous == 0 {
        return "+100%".to_string();
    }
    let growth = (current as f64 - previous as f64) / previous as f64 * 100.0;
    let sign = if growth >= 0.0 { "+" } else { "" };
    format!("{sign}{growth:.1}%")
}
