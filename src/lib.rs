//! Inbox Sentinel — autonomous mailbox-triage loop.
//!
//! Polls an inbox, scores each new message for phishing risk through an
//! external reasoning service, quarantines messages that cross a
//! risk-adaptive threshold, keeps an auditable event log, and emits weekly
//! summaries — indefinitely and unattended.

pub mod classifier;
pub mod config;
pub mod error;
pub mod mailbox;
pub mod monitor;
pub mod notify;
pub mod policy;
pub mod report;
pub mod store;
