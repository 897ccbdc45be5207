//! Liveness beacon.
//!
//! A single scalar float (epoch seconds) overwritten once per cycle. External
//! monitors treat the loop as active while the value is less than 30 seconds
//! old; a stale beacon is the only user-visible failure surface.

use std::path::PathBuf;

use crate::error::StoreError;

pub struct Heartbeat {
    path: PathBuf,
}

impl Heartbeat {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Unconditionally overwrite the stored heartbeat.
    pub fn beat(&self, now: f64) -> Result<(), StoreError> {
        std::fs::write(&self.path, format!("{now}")).map_err(|e| StoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    /// Latest heartbeat, if one has been written and is readable.
    pub fn last_beat(&self) -> Option<f64> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let beacon = Heartbeat::new(dir.path().join("heartbeat.txt"));

        beacon.beat(100.0).unwrap();
        beacon.beat(250.0).unwrap();
        assert_eq!(beacon.last_beat(), Some(250.0));
    }

    #[test]
    fn unwritten_beacon_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let beacon = Heartbeat::new(dir.path().join("heartbeat.txt"));
        assert_eq!(beacon.last_beat(), None);
    }
}
