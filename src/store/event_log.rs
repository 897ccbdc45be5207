//! Append-only event log of quarantine decisions.
//!
//! Backed by a single JSON array rewritten wholesale per append — acceptable
//! at expected scale, and keeps the file directly readable by the dashboard.
//! Entries are never mutated or deleted; chronological sorting is the
//! readers' concern.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Maximum characters of message body kept in an entry.
pub const SNIPPET_MAX_CHARS: usize = 200;

/// One quarantine decision, immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Float epoch seconds (dashboard compares these directly).
    pub timestamp: f64,
    /// Human-readable form of `timestamp`.
    pub date: String,
    pub subject: String,
    pub sender: String,
    pub score: u8,
    pub explanation: String,
    pub recommendation: String,
    pub snippet: String,
}

impl EventLogEntry {
    pub fn new(
        timestamp: f64,
        subject: impl Into<String>,
        sender: impl Into<String>,
        score: u8,
        explanation: impl Into<String>,
        recommendation: impl Into<String>,
        body: &str,
    ) -> Self {
        Self {
            timestamp,
            date: format_date(timestamp),
            subject: subject.into(),
            sender: sender.into(),
            score,
            explanation: explanation.into(),
            recommendation: recommendation.into(),
            snippet: body.chars().take(SNIPPET_MAX_CHARS).collect(),
        }
    }
}

/// Format float epoch seconds as a human-readable UTC date.
pub fn format_date(timestamp: f64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// File-backed event log. Single-writer; no concurrent appends.
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry. Read-modify-write of the whole collection; purely
    /// additive, no deduplication.
    pub fn append(&self, entry: EventLogEntry) -> Result<(), StoreError> {
        let mut entries = self.read_all();
        entries.push(entry);

        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    /// All entries in insertion order. A missing or unreadable file reads as
    /// empty — the log is an audit trail, never a reason to stall the loop.
    pub fn read_all(&self) -> Vec<EventLogEntry> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "Corrupt event log, reading as empty");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }

    /// Entries strictly newer than `cutoff` (epoch seconds), insertion order.
    pub fn read_since(&self, cutoff: f64) -> Vec<EventLogEntry> {
        self.read_all()
            .into_iter()
            .filter(|e| e.timestamp > cutoff)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(timestamp: f64, subject: &str, score: u8) -> EventLogEntry {
        EventLogEntry::new(
            timestamp,
            subject,
            "attacker@evil.com",
            score,
            "urgent tone",
            "delete it",
            "click this link now",
        )
    }

    fn temp_log() -> (tempfile::TempDir, EventLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path().join("phishing_logs.json"));
        (dir, log)
    }

    #[test]
    fn append_then_read_round_trips() {
        let (_dir, log) = temp_log();
        log.append(entry(100.0, "Urgent", 85)).unwrap();

        let entries = log.read_all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject, "Urgent");
        assert_eq!(entries[0].score, 85);
    }

    #[test]
    fn append_is_purely_additive() {
        let (_dir, log) = temp_log();
        log.append(entry(100.0, "Same", 85)).unwrap();
        log.append(entry(100.0, "Same", 85)).unwrap();
        assert_eq!(log.read_all().len(), 2);
    }

    #[test]
    fn insertion_order_preserved() {
        let (_dir, log) = temp_log();
        log.append(entry(300.0, "third", 90)).unwrap();
        log.append(entry(100.0, "first", 80)).unwrap();

        let entries = log.read_all();
        assert_eq!(entries[0].subject, "third");
        assert_eq!(entries[1].subject, "first");
    }

    #[test]
    fn missing_file_reads_empty() {
        let (_dir, log) = temp_log();
        assert!(log.read_all().is_empty());
    }

    #[test]
    fn corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phishing_logs.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert!(EventLog::new(path).read_all().is_empty());
    }

    #[test]
    fn read_since_is_strict() {
        let (_dir, log) = temp_log();
        log.append(entry(100.0, "old", 80)).unwrap();
        log.append(entry(200.0, "boundary", 80)).unwrap();
        log.append(entry(300.0, "new", 80)).unwrap();

        let recent = log.read_since(200.0);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].subject, "new");
    }

    #[test]
    fn entry_snippet_capped() {
        let body = "a".repeat(1000);
        let e = EventLogEntry::new(0.0, "s", "x@y.com", 50, "", "", &body);
        assert_eq!(e.snippet.chars().count(), SNIPPET_MAX_CHARS);
    }

    #[test]
    fn date_formatted_from_timestamp() {
        let e = entry(0.0, "epoch", 50);
        assert_eq!(e.date, "1970-01-01 00:00:00");
    }
}
