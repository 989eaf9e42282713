//! Canvassing screen wiring: session, location, directory, ledger and export.

use crate::directory::PropertyDirectory;
use crate::error::Result;
use crate::export::{Exporter, TransitionGate};
use crate::ledger::ActivityLedger;
use crate::location::LocationProbe;
use crate::metrics;
use crate::models::{ActivityAction, ActivityRecord, DailyStats, PropertyRecord, UserProfile};
use crate::session::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Label recorded when no address has been resolved yet
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// The canvassing screen's state, wired together.
///
/// Each manager keeps its own state; nothing here spans two of them.
pub struct CanvassApp {
    pub session: Arc<SessionStore>,
    pub location: Arc<LocationProbe>,
    directory: PropertyDirectory,
    ledger: ActivityLedger,
    exporter: Exporter,
}

impl CanvassApp {
    /// Compose the managers; call [`CanvassApp::start`] before use
    pub fn new(
        session: Arc<SessionStore>,
        location: Arc<LocationProbe>,
        directory: PropertyDirectory,
        ledger: ActivityLedger,
        exporter: Exporter,
    ) -> Self {
        Self {
            session,
            location,
            directory,
            ledger,
            exporter,
        }
    }

    /// Restore the previous sign-in, if the provider still has it.
    ///
    /// Failures are logged; the app stays usable signed out.
    pub async fn start(&self) -> Option<UserProfile> {
        match self.session.restore_session().await {
            Ok(Some(profile)) => {
                info!(user = %profile.id, "Resumed previous session");
                Some(profile)
            }
            Ok(None) => {
                debug!("Starting signed out");
                None
            }
            Err(e) => {
                warn!(error = %e, "Could not restore previous session");
                None
            }
        }
    }

    #[must_use]
    pub const fn directory(&self) -> &PropertyDirectory {
        &self.directory
    }

    #[must_use]
    pub const fn ledger(&self) -> &ActivityLedger {
        &self.ledger
    }

    /// Look up the property at the current address
    #[must_use]
    pub fn search_property(&self) -> Option<&PropertyRecord> {
        let Some(address) = self.location.current_address() else {
            debug!("Property search without a resolved address");
            return None;
        };
        self.directory.find_property(&address)
    }

    /// Log `action` against the current address
    pub fn record_activity(&mut self, action: ActivityAction) -> ActivityRecord {
        let location = self
            .location
            .current_address()
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        self.ledger.log_activity(&location, action)
    }

    #[must_use]
    pub fn today(&self) -> DailyStats {
        self.ledger.daily_counts()
    }

    pub fn clear_log(&mut self) {
        self.ledger.clear_all();
    }

    /// Export the log once `gate` opens; `None` uses the configured delay
    pub async fn export(&self, gate: Option<TransitionGate>) -> Result<PathBuf> {
        let csv = self.ledger.to_csv()?;
        let gate = gate.unwrap_or_else(|| self.exporter.default_gate());
        let path = self.exporter.export_and_share(&csv, gate).await?;
        metrics::record_export(self.ledger.len());
        info!(path = %path.display(), rows = self.ledger.len(), "Exported activity log");
        Ok(path)
    }
}
