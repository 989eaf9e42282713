//! Doorknock - Field Canvassing Log
//!
//! A Rust library for door-to-door canvassers: resolve where you are, look up
//! the property record for that address, log what happened at the door, and
//! export the day's work as CSV.
//!
//! # Features
//!
//! - Fuzzy address lookup over a bundled property dataset
//! - Append-only activity ledger with daily counts
//! - CSV export with a timestamped file name
//! - Session and location managers over pluggable async services

/// Screen-level wiring of the managers
pub mod app;
/// Configuration management
pub mod config;
/// Property dataset loading and lookup
pub mod directory;
/// Error types
pub mod error;
/// CSV export files and sharing
pub mod export;
/// Activity log
pub mod ledger;
/// Current address tracking
pub mod location;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Signed-in user
pub mod session;
/// Key-value persistence
pub mod storage;

// Re-export key components for easier access
pub use app::CanvassApp;
pub use directory::PropertyDirectory;
pub use error::{DoorknockError, Result};
pub use ledger::ActivityLedger;
pub use models::{ActivityAction, ActivityRecord, DailyStats, PropertyRecord, UserProfile};
