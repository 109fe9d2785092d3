use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::training::{EpochMetrics, TrainingReport};

/// File receiving one JSON object per logged epoch.
pub const RUN_LOG: &str = "run.jsonl";
/// File receiving one JSON object per finished training run.
pub const SUMMARY_LOG: &str = "summary.jsonl";

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

#[derive(Debug, Serialize)]
pub struct EpochLogEntry {
    pub epoch: usize,
    pub error: f32,
    pub converged: bool,
    pub elapsed_ms: u128,
    pub timestamp_ms: u128,
}

pub fn log_training_epoch<P: AsRef<Path>>(
    dir: P,
    metrics: &EpochMetrics,
    converged: bool,
) -> io::Result<()> {
    fs::create_dir_all(&dir)?;
    let entry = EpochLogEntry {
        epoch: metrics.epoch,
        error: metrics.error,
        converged,
        elapsed_ms: metrics.elapsed_ms,
        timestamp_ms: timestamp_ms(),
    };
    append_json_line(dir.as_ref().join(RUN_LOG), &entry)
}

#[derive(Debug, Serialize)]
pub struct SummaryLogEntry {
    pub epochs_run: usize,
    pub final_error: f32,
    pub converged: bool,
    pub total_elapsed_ms: u128,
    pub timestamp_ms: u128,
}

pub fn log_training_summary<P: AsRef<Path>>(dir: P, report: &TrainingReport) -> io::Result<()> {
    fs::create_dir_all(&dir)?;
    let entry = SummaryLogEntry {
        epochs_run: report.epochs_run,
        final_error: report.final_error,
        converged: report.converged,
        total_elapsed_ms: report.total_elapsed_ms,
        timestamp_ms: timestamp_ms(),
    };
    append_json_line(dir.as_ref().join(SUMMARY_LOG), &entry)
}
