//! Metrics names and recording helpers.
//!
//! Nothing is recorded unless the embedding application installs a
//! `metrics` recorder.

use crate::models::ActivityAction;
use metrics::{counter, histogram};

pub const PROPERTY_LOOKUPS_TOTAL: &str = "doorknock_property_lookups_total";
pub const ACTIVITIES_LOGGED_TOTAL: &str = "doorknock_activities_logged_total";
pub const EXPORTS_TOTAL: &str = "doorknock_exports_total";
pub const EXPORT_ROWS: &str = "doorknock_export_rows";

/// Record the outcome of a directory lookup
pub fn record_property_lookup(found: bool) {
    let outcome = if found { "hit" } else { "miss" };
    counter!(PROPERTY_LOOKUPS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a button press
pub fn record_activity(action: ActivityAction) {
    counter!(ACTIVITIES_LOGGED_TOTAL, "action" => action.label()).increment(1);
}

/// Record a finished export and its size
#[allow(clippy::cast_precision_loss)]
pub fn record_export(rows: usize) {
    counter!(EXPORTS_TOTAL).increment(1);
    histogram!(EXPORT_ROWS).record(rows as f64);
}
