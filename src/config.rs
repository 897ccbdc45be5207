//! Configuration, built from environment variables.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default polling interval between triage cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Mailbox (IMAP) connection settings.
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub imap_host: String,
    pub imap_port: u16,
    /// Monitored account address; doubles as the IMAP login name and the
    /// anti-feedback-loop filter (self-originated mail is never classified).
    pub account: String,
    pub password: String,
}

/// Notification (SMTP) settings for warnings and weekly summaries.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub recipient: String,
}

/// Classifier service settings.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: SecretString,
    pub model: String,
}

/// Full monitor configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub mailbox: MailboxConfig,
    pub notify: NotifyConfig,
    pub classifier: ClassifierConfig,
    pub poll_interval_secs: u64,
    /// Directory holding the persisted artifacts shared with the dashboard:
    /// event log, heartbeat, report timestamp, risk profile.
    pub data_dir: PathBuf,
}

impl Config {
    /// Build config from environment variables.
    ///
    /// Required: `SENTINEL_IMAP_USER`, `SENTINEL_IMAP_PASS`, `OPENAI_API_KEY`.
    /// Everything else has Gmail-shaped defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let account = require("SENTINEL_IMAP_USER")?;
        let password = require("SENTINEL_IMAP_PASS")?;
        let api_key = require("OPENAI_API_KEY")?;

        let imap_host =
            std::env::var("SENTINEL_IMAP_HOST").unwrap_or_else(|_| "imap.gmail.com".into());
        let imap_port = parse_port("SENTINEL_IMAP_PORT", 993)?;

        let smtp_host = std::env::var("SENTINEL_SMTP_HOST")
            .unwrap_or_else(|_| imap_host.replace("imap", "smtp"));
        let smtp_port = parse_port("SENTINEL_SMTP_PORT", 465)?;

        // Warnings default to the monitored inbox itself.
        let recipient =
            std::env::var("SENTINEL_WARNING_RECIPIENT").unwrap_or_else(|_| account.clone());

        let model =
            std::env::var("SENTINEL_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let poll_interval_secs: u64 = std::env::var("SENTINEL_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let data_dir = std::env::var("SENTINEL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        Ok(Self {
            mailbox: MailboxConfig {
                imap_host,
                imap_port,
                account: account.clone(),
                password: password.clone(),
            },
            notify: NotifyConfig {
                smtp_host,
                smtp_port,
                username: account,
                password,
                recipient,
            },
            classifier: ClassifierConfig {
                api_key: SecretString::from(api_key),
                model,
            },
            poll_interval_secs,
            data_dir,
        })
    }

    /// Path of the append-only event log (read by the dashboard).
    pub fn event_log_path(&self) -> PathBuf {
        self.data_dir.join("phishing_logs.json")
    }

    /// Path of the liveness beacon (read by the dashboard).
    pub fn heartbeat_path(&self) -> PathBuf {
        self.data_dir.join("heartbeat.txt")
    }

    /// Path of the durable weekly-report timestamp.
    pub fn report_state_path(&self) -> PathBuf {
        self.data_dir.join("last_report.txt")
    }

    /// Path of the risk-profile collection (written by the training simulators).
    pub fn risk_profile_path(&self) -> PathBuf {
        self.data_dir.join("phishing_users.json")
    }
}

fn require(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn parse_port(key: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}' is not a valid port"),
        }),
    }
}
