//! Notification channel — SMTP via lettre.
//!
//! Carries two message shapes: the per-quarantine warning (subject embeds the
//! score, body carries explanation/recommendation) and the weekly aggregate
//! summary.

use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::store::EventLogEntry;

/// Maximum subject+score pairs listed in a weekly summary.
const SUMMARY_MAX_LINES: usize = 5;

/// Outbound notification capability. The production implementation speaks
/// SMTP; tests use capturing stubs.
pub trait Notifier: Send + Sync {
    fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// SMTP notifier over a secure mail-submission session.
pub struct SmtpNotifier {
    config: NotifyConfig,
}

impl SmtpNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );

        let transport = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| NotifyError::Send(format!("SMTP relay error: {e}")))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        let email = Message::builder()
            .from(
                self.config
                    .username
                    .parse()
                    .map_err(|e| NotifyError::Build(format!("invalid from address: {e}")))?,
            )
            .to(self
                .config
                .recipient
                .parse()
                .map_err(|e| NotifyError::Build(format!("invalid to address: {e}")))?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        transport
            .send(&email)
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        tracing::info!(to = %self.config.recipient, subject, "Notification sent");
        Ok(())
    }
}

// ── Message formatting ──────────────────────────────────────────────

/// Subject line for a per-quarantine warning.
pub fn warning_subject(score: u8) -> String {
    format!("[WARNING] Suspicious Email Detected ({score}/100)")
}

/// Body for a per-quarantine warning.
pub fn warning_body(
    original_subject: &str,
    score: u8,
    explanation: &str,
    recommendation: &str,
) -> String {
    format!(
        "Possible phishing attempt detected!\n\n\
         Subject: {original_subject}\n\
         Risk Score: {score} / 100\n\n\
         Explanation:\n{explanation}\n\n\
         Recommendation:\n{recommendation}\n\n\
         Stay safe!"
    )
}

/// Subject and body for the weekly aggregate summary.
pub fn weekly_summary(entries: &[EventLogEntry]) -> (String, String) {
    let total = entries.len();
    let subject = format!("Weekly Phishing Report: {total} message(s) quarantined");

    let mut body = format!("Quarantined this week: {total}\n\n");
    for entry in entries.iter().take(SUMMARY_MAX_LINES) {
        body.push_str(&format!("- {} ({}/100)\n", entry.subject, entry.score));
    }
    if total > SUMMARY_MAX_LINES {
        body.push_str(&format!("+{} more\n", total - SUMMARY_MAX_LINES));
    }

    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(subject: &str, score: u8) -> EventLogEntry {
        EventLogEntry::new(0.0, subject, "x@evil.com", score, "why", "what", "body")
    }

    #[test]
    fn warning_subject_embeds_score() {
        assert_eq!(
            warning_subject(85),
            "[WARNING] Suspicious Email Detected (85/100)"
        );
    }

    #[test]
    fn warning_body_carries_verdict_text() {
        let body = warning_body("Verify now", 85, "urgent tone", "delete it");
        assert!(body.contains("Subject: Verify now"));
        assert!(body.contains("Risk Score: 85 / 100"));
        assert!(body.contains("urgent tone"));
        assert!(body.contains("delete it"));
    }

    #[test]
    fn weekly_summary_counts_and_lists() {
        let entries = vec![entry("one", 80), entry("two", 90)];
        let (subject, body) = weekly_summary(&entries);
        assert!(subject.contains('2'));
        assert!(body.contains("- one (80/100)"));
        assert!(body.contains("- two (90/100)"));
        assert!(!body.contains("more"));
    }

    #[test]
    fn weekly_summary_truncates_after_five() {
        let entries: Vec<_> = (0..8).map(|i| entry(&format!("s{i}"), 70)).collect();
        let (_, body) = weekly_summary(&entries);
        assert!(body.contains("- s4 (70/100)"));
        assert!(!body.contains("- s5"));
        assert!(body.contains("+3 more"));
    }
}
