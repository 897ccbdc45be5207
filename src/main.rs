use std::sync::Arc;
use std::time::Duration;

use inbox_sentinel::classifier::OpenAiClassifier;
use inbox_sentinel::config::Config;
use inbox_sentinel::mailbox::ImapMailbox;
use inbox_sentinel::monitor::Monitor;
use inbox_sentinel::notify::SmtpNotifier;
use inbox_sentinel::report::WeeklyReporter;
use inbox_sentinel::store::{EventLog, Heartbeat, ReportState, RiskProfileStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  required: SENTINEL_IMAP_USER, SENTINEL_IMAP_PASS, OPENAI_API_KEY");
        std::process::exit(1);
    });

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        eprintln!(
            "Error: could not create data dir {}: {e}",
            config.data_dir.display()
        );
        std::process::exit(1);
    }

    eprintln!("Inbox Sentinel v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Account: {}", config.mailbox.account);
    eprintln!(
        "   IMAP: {}:{}  SMTP: {}:{}",
        config.mailbox.imap_host,
        config.mailbox.imap_port,
        config.notify.smtp_host,
        config.notify.smtp_port
    );
    eprintln!("   Model: {}", config.classifier.model);
    eprintln!("   Data: {}", config.data_dir.display());

    // Risk profile is read once per process lifetime; mid-run changes take
    // effect only after restart.
    let risk = RiskProfileStore::new(config.risk_profile_path()).load_score();

    let notifier = Arc::new(SmtpNotifier::new(config.notify.clone()));
    let reporter = WeeklyReporter::new(
        EventLog::new(config.event_log_path()),
        ReportState::new(config.report_state_path()),
        Arc::clone(&notifier),
    );

    let monitor = Monitor::new(
        ImapMailbox::new(config.mailbox.clone()),
        OpenAiClassifier::new(config.classifier.clone()),
        notifier,
        EventLog::new(config.event_log_path()),
        Heartbeat::new(config.heartbeat_path()),
        reporter,
        risk,
        Duration::from_secs(config.poll_interval_secs),
    );

    monitor.run().await;
    Ok(())
}
