//! Activity ledger.
//!
//! Records are kept newest first. The whole list is written back to the
//! store after every append or clear; a failed write is logged and the
//! in-memory list stays authoritative.

use crate::error::{DoorknockError, Result};
use crate::metrics;
use crate::models::{ActivityAction, ActivityRecord, DailyStats};
use crate::storage::{load_json, save_json, KeyValueStore, ACTIVITY_RECORDS_KEY};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Header row of the CSV export
pub const CSV_HEADER: [&str; 4] = ["Record ID", "Timestamp", "Current Location", "Activity Button Pressed"];

/// Timestamp layout used in the CSV export
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the current local time
pub trait Clock: Send + Sync {
    /// Current local time
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Visit outcomes, newest first, mirrored to the key-value store
pub struct ActivityLedger {
    records: Vec<ActivityRecord>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl ActivityLedger {
    /// Restore the ledger from `store`, starting empty if nothing usable is stored
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Like [`ActivityLedger::new`], reading time from `clock`
    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let records: Vec<ActivityRecord> = load_json(&*store, ACTIVITY_RECORDS_KEY).unwrap_or_default();
        info!("Restored {} activity records", records.len());
        Self { records, store, clock }
    }

    /// Records, most recent first
    #[must_use]
    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Log a button press at `location` and persist the ledger
    pub fn log_activity(&mut self, location: &str, action: ActivityAction) -> ActivityRecord {
        let record = ActivityRecord::new(location, action, self.clock.now());
        debug!(record_id = %record.record_id, action = %action, location, "Logging activity");
        self.records.insert(0, record.clone());
        metrics::record_activity(action);
        self.persist();
        record
    }

    /// Remove every record and persist the empty ledger
    pub fn clear_all(&mut self) {
        info!("Clearing {} activity records", self.records.len());
        self.records.clear();
        self.persist();
    }

    /// Counts for records made today, local time
    #[must_use]
    pub fn daily_counts(&self) -> DailyStats {
        self.daily_counts_at(self.clock.now())
    }

    /// Counts for records on the same local calendar day as `now`
    #[must_use]
    pub fn daily_counts_at(&self, now: DateTime<Local>) -> DailyStats {
        let today = now.date_naive();
        let mut stats = DailyStats::default();
        for record in self.records.iter().filter(|r| r.timestamp.date_naive() == today) {
            stats.tally(record.action);
        }
        stats
    }

    /// Render the ledger as CSV, oldest record first
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Necessary)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(CSV_HEADER)?;
        for record in self.records.iter().rev() {
            writer.write_record([
                record.record_id.to_string().as_str(),
                record.timestamp.format(CSV_TIMESTAMP_FORMAT).to_string().as_str(),
                record.location_label.as_str(),
                record.action.label(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DoorknockError::Other(format!("Failed to finish CSV export: {e}")))?;
        String::from_utf8(bytes).map_err(|e| DoorknockError::Other(e.to_string()))
    }

    fn persist(&self) {
        if let Err(e) = save_json(&*self.store, ACTIVITY_RECORDS_KEY, &self.records) {
            error!(error = %e, "Failed to persist activity records");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_empty_ledger_exports_header_only() {
        let ledger = ActivityLedger::new(Arc::new(MemoryStore::new()));
        assert_eq!(
            ledger.to_csv().unwrap(),
            "Record ID,Timestamp,Current Location,Activity Button Pressed\n"
        );
    }

    #[test]
    fn test_plain_fields_are_not_quoted() {
        let mut ledger = ActivityLedger::new(Arc::new(MemoryStore::new()));
        let record = ledger.log_activity("12 Oak Ave", ActivityAction::FlyerDropped);
        let csv = ledger.to_csv().unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            format!(
                "{},{},12 Oak Ave,Flyer Dropped",
                record.record_id,
                record.timestamp.format(CSV_TIMESTAMP_FORMAT)
            )
        );
    }
}
