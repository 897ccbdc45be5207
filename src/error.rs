//! Error types for Inbox Sentinel.

/// Top-level error type for the monitor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox transport and protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Failed to connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Authentication failed for {user}")]
    AuthFailed { user: String },

    #[error("Protocol error during {command}: {reason}")]
    Protocol { command: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classifier service errors.
///
/// These never surface as quarantines: every classifier failure resolves
/// to the fail-open verdict at the classification seam.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Request to {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Empty reply from {provider}")]
    EmptyReply { provider: String },

    #[error("Unparsable reply: {0}")]
    Unparsable(String),
}

/// Notification channel errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to build notification: {0}")]
    Build(String),

    #[error("SMTP dispatch failed: {0}")]
    Send(String),
}

/// Persisted store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the monitor.
pub type Result<T> = std::result::Result<T, Error>;
