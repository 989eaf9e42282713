//! Tests for export file naming, writing and the share sheet hand-off

use async_trait::async_trait;
use chrono::{Local, TimeZone};
use doorknock::config::ExportConfig;
use doorknock::error::{DoorknockError, Result};
use doorknock::export::{export_file_name, write_export_file, Exporter, ShareSheet, TransitionGate};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::oneshot;

/// Share sheet that remembers what it was shown
#[derive(Clone, Default)]
struct RecordingShareSheet {
    shown: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    fail: bool,
}

#[async_trait]
impl ShareSheet for RecordingShareSheet {
    async fn present(&self, path: &Path, excluded_targets: &[String]) -> Result<()> {
        self.shown
            .lock()
            .unwrap()
            .push((path.to_path_buf(), excluded_targets.to_vec()));
        if self.fail {
            return Err(DoorknockError::Other("share sheet dismissed".to_string()));
        }
        Ok(())
    }
}

fn export_config(dir: &Path) -> ExportConfig {
    ExportConfig {
        output_directory: dir.join("exports").display().to_string(),
        share_delay_ms: 500,
        excluded_share_targets: vec!["post_to_facebook".to_string(), "post_to_twitter".to_string()],
    }
}

const CSV: &str = "Record ID,Timestamp,Current Location,Activity Button Pressed\n";

#[test]
fn test_export_file_name_uses_local_timestamp() {
    let at = Local.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).single().unwrap();
    assert_eq!(export_file_name(at), "doorknocking_log_2025-01-15_14-30-00.csv");
}

#[test]
fn test_write_export_file_creates_directory() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_dir = temp_dir.path().join("nested").join("out");
    let at = Local.with_ymd_and_hms(2025, 6, 1, 8, 5, 9).single().unwrap();

    let path = write_export_file(CSV, &output_dir, at).expect("Export failed");

    assert_eq!(path, output_dir.join("doorknocking_log_2025-06-01_08-05-09.csv"));
    assert_eq!(fs::read_to_string(&path).unwrap(), CSV);
}

#[tokio::test]
async fn test_export_and_share_hands_file_to_share_sheet() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let sheet = RecordingShareSheet::default();
    let exporter = Exporter::new(&export_config(temp_dir.path()), Box::new(sheet.clone()));

    let path = exporter
        .export_and_share(CSV, TransitionGate::Immediate)
        .await
        .expect("Export failed");

    assert!(path.exists());
    assert!(path.starts_with(exporter.output_dir()));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("doorknocking_log_") && name.ends_with(".csv"));

    let shown = sheet.shown.lock().unwrap();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, path);
    assert_eq!(shown[0].1, vec!["post_to_facebook", "post_to_twitter"]);
}

#[tokio::test]
async fn test_share_failure_still_returns_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let sheet = RecordingShareSheet {
        fail: true,
        ..RecordingShareSheet::default()
    };
    let exporter = Exporter::new(&export_config(temp_dir.path()), Box::new(sheet));

    let path = exporter.export_and_share(CSV, TransitionGate::Immediate).await.unwrap();
    assert_eq!(fs::read_to_string(path).unwrap(), CSV);
}

#[tokio::test]
async fn test_signal_gate_waits_for_transition() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let sheet = RecordingShareSheet::default();
    let exporter = Exporter::new(&export_config(temp_dir.path()), Box::new(sheet.clone()));
    let (finished_tx, finished_rx) = oneshot::channel();

    let (path, ()) = tokio::join!(
        exporter.export_and_share(CSV, TransitionGate::Signal(finished_rx)),
        async {
            tokio::task::yield_now().await;
            assert!(sheet.shown.lock().unwrap().is_empty());
            finished_tx.send(()).unwrap();
        }
    );

    assert!(path.unwrap().exists());
    assert_eq!(sheet.shown.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_gate_is_configured_delay() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let mut config = export_config(temp_dir.path());
    config.share_delay_ms = 750;
    let exporter = Exporter::new(&config, Box::new(RecordingShareSheet::default()));

    assert!(matches!(exporter.default_gate(), TransitionGate::Delay(d) if d == config.share_delay()));

    let started = tokio::time::Instant::now();
    exporter.export_and_share(CSV, exporter.default_gate()).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(750));
}
