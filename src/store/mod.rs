//! Persisted state — everything the monitor reads or writes on disk.
//!
//! Every store has exactly one writer (this process, one loop), so no
//! locking is used. File shapes are shared with the external dashboard and
//! the training simulators; see each module for the format it owns.

pub mod event_log;
pub mod heartbeat;
pub mod report;
pub mod risk;

pub use event_log::{EventLog, EventLogEntry};
pub use heartbeat::Heartbeat;
pub use report::ReportState;
pub use risk::RiskProfileStore;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as float epoch seconds, the unit used by every persisted
/// artifact (the dashboard compares these directly).
pub fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
