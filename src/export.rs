//! File writing for the activity export.
//!
//! The ledger's CSV is written to a timestamped file in the output directory
//! and handed to the platform share sheet.

use crate::config::ExportConfig;
use crate::error::Result;
use crate::logging::OperationTimer;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Platform share mechanism
#[async_trait]
pub trait ShareSheet: Send + Sync {
    /// Offer `path` to the user, hiding `excluded_targets` where supported
    async fn present(&self, path: &Path, excluded_targets: &[String]) -> Result<()>;
}

/// Share sheet for headless use: logs the path and returns
#[derive(Debug, Clone, Copy, Default)]
pub struct LogShareSheet;

#[async_trait]
impl ShareSheet for LogShareSheet {
    async fn present(&self, path: &Path, excluded_targets: &[String]) -> Result<()> {
        info!(path = %path.display(), excluded = excluded_targets.len(), "Export ready to share");
        Ok(())
    }
}

/// What to wait for before writing the export
#[derive(Debug)]
pub enum TransitionGate {
    /// Proceed immediately
    Immediate,
    /// Fixed pause while the dismiss transition plays
    Delay(Duration),
    /// Wait until the UI reports the transition finished (or drops the sender)
    Signal(oneshot::Receiver<()>),
}

impl TransitionGate {
    pub async fn wait(self) {
        match self {
            Self::Immediate => {}
            Self::Delay(delay) => tokio::time::sleep(delay).await,
            Self::Signal(finished) => {
                if finished.await.is_err() {
                    debug!("Transition signal dropped, exporting anyway");
                }
            }
        }
    }
}

/// Name of the export file for a given moment, e.g. `doorknocking_log_2025-01-15_14-30-00.csv`
#[must_use]
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("doorknocking_log_{}.csv", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write `contents` to `output_dir/<export file name>`.
///
/// # Returns
///
/// Path to the created file
pub fn write_export_file(contents: &str, output_dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let file_path = output_dir.join(export_file_name(at));

    let file = File::create(&file_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(contents.as_bytes())?;
    writer.flush()?;

    debug!(path = %file_path.display(), bytes = contents.len(), "Wrote export file");
    Ok(file_path)
}

/// Writes export files and hands them to the share sheet
pub struct Exporter {
    output_dir: PathBuf,
    excluded_targets: Vec<String>,
    share_delay: Duration,
    share_sheet: Box<dyn ShareSheet>,
}

impl Exporter {
    /// Exporter writing into the configured output directory
    pub fn new(config: &ExportConfig, share_sheet: Box<dyn ShareSheet>) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output_directory),
            excluded_targets: config.excluded_share_targets.clone(),
            share_delay: config.share_delay(),
            share_sheet,
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The configured fixed-delay gate
    #[must_use]
    pub const fn default_gate(&self) -> TransitionGate {
        TransitionGate::Delay(self.share_delay)
    }

    /// Wait on `gate`, write `csv` to a new file and present it for sharing.
    ///
    /// A share sheet failure is logged; the written file is still returned.
    pub async fn export_and_share(&self, csv: &str, gate: TransitionGate) -> Result<PathBuf> {
        gate.wait().await;

        let timer = OperationTimer::new("export_activity_log");
        let path = write_export_file(csv, &self.output_dir, Local::now())?;
        timer.finish();

        if let Err(e) = self.share_sheet.present(&path, &self.excluded_targets).await {
            warn!(path = %path.display(), error = %e, "Share sheet failed");
        }
        Ok(path)
    }
}
