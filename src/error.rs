//! Error types for the doorknock library.
//!
//! This module provides custom error types using `thiserror` so each manager
//! can report a specific failure while callers decide how far to degrade.

use thiserror::Error;

/// Errors that can occur in the doorknock application.
#[derive(Error, Debug)]
pub enum DoorknockError {
    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Sign-in or session restore was rejected, or the provider was unreachable
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The user has not granted location access
    #[error("Location permission denied")]
    LocationPermissionDenied,

    /// Reverse geocoding did not produce an address
    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    /// A response arrived after a newer request was issued and was dropped
    #[error("Superseded response discarded: {0}")]
    Superseded(&'static str),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown activity button name
    #[error("Unknown activity: {0}")]
    InvalidAction(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `DoorknockError`
pub type Result<T> = std::result::Result<T, DoorknockError>;

impl From<anyhow::Error> for DoorknockError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<sled::Error> for DoorknockError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
