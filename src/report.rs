//! Weekly reporter — time-windowed aggregation over the event log.

use std::sync::Arc;

use crate::notify::{self, Notifier};
use crate::store::{EventLog, ReportState};

/// Reporting window: one week, in epoch seconds.
pub const REPORT_INTERVAL_SECS: f64 = 604_800.0;

/// What a report check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The window has not elapsed yet.
    NotDue,
    /// Window elapsed but held no entries; dispatch skipped, window reset.
    SkippedEmpty,
    Sent,
    /// Dispatch failed; the window was still reset (a dropped report beats a
    /// retry storm against a flaky transport).
    DispatchFailed,
}

pub struct WeeklyReporter<N: Notifier> {
    log: EventLog,
    state: ReportState,
    notifier: Arc<N>,
}

impl<N: Notifier> WeeklyReporter<N> {
    pub fn new(log: EventLog, state: ReportState, notifier: Arc<N>) -> Self {
        Self {
            log,
            state,
            notifier,
        }
    }

    /// Dispatch a summary if a full week has elapsed since the last report.
    ///
    /// With no prior state the last report time reads 0, so the first run is
    /// immediately due. Whatever happens past the due check, the window is
    /// advanced to `now` — `last_report_time` only ever increases.
    pub fn check_and_send(&self, now: f64) -> ReportOutcome {
        let last = self.state.last_report_time();
        if now - last < REPORT_INTERVAL_SECS {
            return ReportOutcome::NotDue;
        }

        let entries = self.log.read_since(now - REPORT_INTERVAL_SECS);

        let outcome = if entries.is_empty() {
            tracing::info!("Weekly report due but no quarantines this window, skipping dispatch");
            ReportOutcome::SkippedEmpty
        } else {
            let (subject, body) = notify::weekly_summary(&entries);
            match self.notifier.notify(&subject, &body) {
                Ok(()) => {
                    tracing::info!(count = entries.len(), "Weekly report sent");
                    ReportOutcome::Sent
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Weekly report dispatch failed, dropping report");
                    ReportOutcome::DispatchFailed
                }
            }
        };

        if let Err(e) = self.state.advance(now) {
            tracing::warn!(error = %e, "Failed to persist report window reset");
        }
        outcome
    }
}
