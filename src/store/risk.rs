//! Risk profile reader.
//!
//! The training simulators append `{name, score, color}` records to a JSON
//! collection; this side only consults the first entry's score (single-subject
//! assumption inherited from the simulators) and never writes.

use std::path::PathBuf;

use serde::Deserialize;

/// Score assumed when no usable profile exists.
pub const DEFAULT_RISK_SCORE: u8 = 50;

#[derive(Debug, Deserialize)]
struct RiskRecord {
    /// Absent scores are treated like any other unusable profile and fall
    /// back to the moderate default, not zero.
    score: Option<i64>,
}

/// Read-only view over the risk-profile collection.
pub struct RiskProfileStore {
    path: PathBuf,
}

impl RiskProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Vulnerability score of the monitored subject, 0–100.
    ///
    /// Never fails: absence, unreadable files, and parse errors all fall back
    /// to [`DEFAULT_RISK_SCORE`].
    pub fn load_score(&self) -> u8 {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => {
                tracing::info!(
                    path = %self.path.display(),
                    "No risk profile found, assuming moderate risk"
                );
                return DEFAULT_RISK_SCORE;
            }
        };

        let records: Vec<RiskRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Corrupt risk profile, assuming moderate risk"
                );
                return DEFAULT_RISK_SCORE;
            }
        };

        records
            .first()
            .and_then(|r| r.score)
            .map(|score| score.clamp(0, 100) as u8)
            .unwrap_or(DEFAULT_RISK_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(contents: Option<&str>) -> (tempfile::TempDir, RiskProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phishing_users.json");
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        (dir, RiskProfileStore::new(path))
    }

    #[test]
    fn first_entry_is_authoritative() {
        let (_dir, store) = store_with(Some(
            r#"[{"name": "Ana", "score": 75, "color": "red"},
                {"name": "Bob", "score": 10, "color": "green"}]"#,
        ));
        assert_eq!(store.load_score(), 75);
    }

    #[test]
    fn missing_file_defaults() {
        let (_dir, store) = store_with(None);
        assert_eq!(store.load_score(), DEFAULT_RISK_SCORE);
    }

    #[test]
    fn corrupt_file_defaults() {
        let (_dir, store) = store_with(Some("{{{{"));
        assert_eq!(store.load_score(), DEFAULT_RISK_SCORE);
    }

    #[test]
    fn empty_collection_defaults() {
        let (_dir, store) = store_with(Some("[]"));
        assert_eq!(store.load_score(), DEFAULT_RISK_SCORE);
    }

    #[test]
    fn out_of_range_score_clamped() {
        let (_dir, store) = store_with(Some(r#"[{"name": "x", "score": 400}]"#));
        assert_eq!(store.load_score(), 100);
    }

    #[test]
    fn missing_score_field_defaults() {
        let (_dir, store) = store_with(Some(r#"[{"name": "x", "color": "green"}]"#));
        assert_eq!(store.load_score(), DEFAULT_RISK_SCORE);
    }
}
