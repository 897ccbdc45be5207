//! Orchestration loop — one fixed-interval triage cycle over the inbox.
//!
//! Per cycle, strictly ordered: heartbeat → weekly report check → fetch
//! unseen → per message (classify → decide → quarantine path) → batched
//! expunge + session close → sleep. No failure anywhere in a cycle escapes
//! as a crash; everything is logged and retried next cycle. The process
//! stops only via external signal.

use std::sync::Arc;
use std::time::Duration;

use crate::classifier::Classifier;
use crate::error::MailboxError;
use crate::mailbox::{InboundMessage, Mailbox, MailboxSession};
use crate::notify::{self, Notifier};
use crate::policy::{self, Decision};
use crate::report::WeeklyReporter;
use crate::store::{self, EventLog, EventLogEntry, Heartbeat};

/// What one cycle did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub fetched: usize,
    pub quarantined: usize,
}

/// The triage monitor. Single logical thread of control: messages within a
/// cycle are processed sequentially, and the loop is never invoked
/// concurrently with itself.
pub struct Monitor<M, C, N>
where
    M: Mailbox,
    C: Classifier,
    N: Notifier,
{
    mailbox: Arc<M>,
    classifier: C,
    notifier: Arc<N>,
    event_log: EventLog,
    heartbeat: Heartbeat,
    reporter: WeeklyReporter<N>,
    /// Subject risk score, loaded once per process lifetime. Mid-run changes
    /// take effect only after restart.
    risk: u8,
    threshold: u8,
    poll_interval: Duration,
}

impl<M, C, N> Monitor<M, C, N>
where
    M: Mailbox + 'static,
    C: Classifier,
    N: Notifier,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mailbox: M,
        classifier: C,
        notifier: Arc<N>,
        event_log: EventLog,
        heartbeat: Heartbeat,
        reporter: WeeklyReporter<N>,
        risk: u8,
        poll_interval: Duration,
    ) -> Self {
        let threshold = policy::threshold(risk);
        tracing::info!(risk, threshold, "Monitor configured");
        Self {
            mailbox: Arc::new(mailbox),
            classifier,
            notifier,
            event_log,
            heartbeat,
            reporter,
            risk,
            threshold,
            poll_interval,
        }
    }

    /// Run indefinitely. There is no terminal state short of external
    /// termination.
    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.poll_interval.as_secs(),
            "Monitoring inbox"
        );
        loop {
            let summary = self.run_cycle().await;
            if summary.fetched > 0 {
                tracing::info!(
                    fetched = summary.fetched,
                    quarantined = summary.quarantined,
                    "Cycle complete"
                );
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One triage cycle. Never fails; partial failures are logged and
    /// isolated so a single bad message or flaky dependency cannot stall
    /// the loop.
    pub async fn run_cycle(&self) -> CycleSummary {
        let now = store::epoch_now();

        if let Err(e) = self.heartbeat.beat(now) {
            tracing::warn!(error = %e, "Heartbeat write failed");
        }

        self.reporter.check_and_send(now);

        // Fresh session per cycle; a transport or auth failure here leaves
        // mailbox state untouched and the cycle is simply skipped.
        let mailbox = Arc::clone(&self.mailbox);
        let fetched = tokio::task::spawn_blocking(move || {
            let mut session = mailbox.connect()?;
            let messages = session.fetch_unseen()?;
            Ok::<_, MailboxError>((session, messages))
        })
        .await;

        let (session, messages) = match fetched {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Mailbox fetch failed, retrying next cycle");
                return CycleSummary::default();
            }
            Err(e) => {
                tracing::error!(error = %e, "Mailbox fetch task panicked");
                return CycleSummary::default();
            }
        };

        if !messages.is_empty() {
            tracing::info!(count = messages.len(), "Found new message(s)");
        }

        let mut summary = CycleSummary {
            fetched: messages.len(),
            quarantined: 0,
        };

        // The session travels through each blocking mutation and comes back;
        // destructive expunge waits until every decision is made.
        let mut session = Some(session);
        for message in &messages {
            if self.triage_one(message, &mut session).await {
                summary.quarantined += 1;
            }
            if session.is_none() {
                break;
            }
        }

        if let Some(session) = session.take() {
            // The destructive expunge only runs for cycles that handled
            // messages; an idle cycle closes with a bare logout.
            let expunge = summary.fetched > 0;
            match tokio::task::spawn_blocking(move || session.close(expunge)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "Session close failed"),
                Err(e) => tracing::error!(error = %e, "Session close task panicked"),
            }
        }

        summary
    }

    /// Classify, decide, and (if needed) quarantine one message. Returns
    /// whether the message was quarantined in the mailbox.
    async fn triage_one(
        &self,
        message: &InboundMessage,
        session: &mut Option<M::Session>,
    ) -> bool {
        tracing::debug!(subject = %message.subject, sender = %message.sender, "Analyzing message");

        // classify() never fails: service and parse errors fail open to a
        // zero-risk verdict, so a flaky classifier cannot mass-quarantine.
        let verdict = self
            .classifier
            .classify(&message.subject, &message.body, self.risk)
            .await;

        if policy::decide(verdict.phishing_score, self.threshold) == Decision::Allow {
            tracing::debug!(
                score = verdict.phishing_score,
                threshold = self.threshold,
                "Below threshold, leaving message untouched"
            );
            return false;
        }

        tracing::info!(
            subject = %message.subject,
            score = verdict.phishing_score,
            threshold = self.threshold,
            "Quarantining message"
        );

        // Log before mutating: quarantine implies logging, never the reverse.
        let entry = EventLogEntry::new(
            store::epoch_now(),
            &message.subject,
            &message.sender,
            verdict.phishing_score,
            &verdict.explanation,
            &verdict.recommendation,
            &message.body,
        );
        if let Err(e) = self.event_log.append(entry) {
            tracing::warn!(error = %e, "Failed to append event log entry");
        }

        let warning = notify::warning_body(
            &message.subject,
            verdict.phishing_score,
            &verdict.explanation,
            &verdict.recommendation,
        );
        if let Err(e) = self
            .notifier
            .notify(&notify::warning_subject(verdict.phishing_score), &warning)
        {
            tracing::warn!(error = %e, "Warning notification failed");
        }

        let Some(live) = session.take() else {
            return false;
        };
        let id = message.id.clone();
        match tokio::task::spawn_blocking(move || {
            let mut live = live;
            let result = live.quarantine(&id);
            (live, result)
        })
        .await
        {
            Ok((live, result)) => {
                *session = Some(live);
                match result {
                    Ok(()) => true,
                    Err(e) => {
                        // Isolated: remaining messages still get processed.
                        tracing::warn!(id = %message.id, error = %e, "Quarantine failed for message");
                        false
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Quarantine task panicked, abandoning session");
                false
            }
        }
    }
}
