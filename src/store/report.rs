//! Durable weekly-report timestamp.
//!
//! A single scalar float (epoch seconds) in a text file. Monotonically
//! non-decreasing; a fresh install reads as 0, which makes the first report
//! immediately due.

use std::path::PathBuf;

use crate::error::StoreError;

/// Durable `last_report_time`, cross-restart.
pub struct ReportState {
    path: PathBuf,
}

impl ReportState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Epoch seconds of the last report window reset; 0.0 when no state
    /// exists yet or the file is unreadable.
    pub fn last_report_time(&self) -> f64 {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0.0)
    }

    /// Advance `last_report_time` to `now`. Ignored if it would move the
    /// timestamp backwards.
    pub fn advance(&self, now: f64) -> Result<(), StoreError> {
        if now <= self.last_report_time() {
            return Ok(());
        }
        std::fs::write(&self.path, format!("{now}")).map_err(|e| StoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}
