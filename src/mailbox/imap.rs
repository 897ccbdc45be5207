//! Gmail mailbox adapter — raw IMAP over rustls.
//!
//! One session per polling cycle: login + SELECT at connect, SEARCH UNSEEN
//! and BODY.PEEK fetches for listing (PEEK so nothing is marked read),
//! label/flag stores for quarantine, EXPUNGE + LOGOUT at close.

use std::io::Write as IoWrite;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use mail_parser::MessageParser;

use crate::config::MailboxConfig;
use crate::error::MailboxError;
use crate::mailbox::message::{self, InboundMessage};
use crate::mailbox::{Mailbox, MailboxSession};

const READ_TIMEOUT: Duration = Duration::from_secs(30);

type TlsStream = rustls::StreamOwned<rustls::ClientConnection, TcpStream>;

/// Gmail-backed mailbox. Holds connection settings; each cycle opens a fresh
/// [`ImapSession`].
pub struct ImapMailbox {
    config: MailboxConfig,
}

impl ImapMailbox {
    pub fn new(config: MailboxConfig) -> Self {
        Self { config }
    }
}

impl Mailbox for ImapMailbox {
    type Session = ImapSession;

    fn connect(&self) -> Result<ImapSession, MailboxError> {
        ImapSession::open(&self.config)
    }
}

/// One authenticated IMAP session with the inbox selected.
pub struct ImapSession {
    tls: TlsStream,
    account: String,
    tag_counter: u32,
}

impl ImapSession {
    fn open(config: &MailboxConfig) -> Result<Self, MailboxError> {
        let tcp = TcpStream::connect((&*config.imap_host, config.imap_port)).map_err(|e| {
            MailboxError::Connect {
                host: config.imap_host.clone(),
                port: config.imap_port,
                reason: e.to_string(),
            }
        })?;
        tcp.set_read_timeout(Some(READ_TIMEOUT))?;

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );
        let server_name: rustls::pki_types::ServerName<'_> =
            rustls::pki_types::ServerName::try_from(config.imap_host.clone())
                .map_err(|e| MailboxError::Tls(e.to_string()))?;
        let conn = rustls::ClientConnection::new(tls_config, server_name)
            .map_err(|e| MailboxError::Tls(e.to_string()))?;

        let mut session = Self {
            tls: rustls::StreamOwned::new(conn, tcp),
            account: config.account.clone(),
            tag_counter: 0,
        };

        let _greeting = session.read_line()?;

        let login = session.send_cmd(&format!(
            "LOGIN \"{}\" \"{}\"",
            config.account, config.password
        ))?;
        if !is_ok_response(&login) {
            return Err(MailboxError::AuthFailed {
                user: config.account.clone(),
            });
        }

        let select = session.send_cmd("SELECT \"INBOX\"")?;
        ensure_ok(&select, "SELECT")?;

        Ok(session)
    }

    fn next_tag(&mut self) -> String {
        self.tag_counter += 1;
        format!("A{}", self.tag_counter)
    }

    fn read_line(&mut self) -> Result<String, MailboxError> {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            match std::io::Read::read(&mut self.tls, &mut byte) {
                Ok(0) => {
                    return Err(MailboxError::Protocol {
                        command: "read".into(),
                        reason: "connection closed".into(),
                    });
                }
                Ok(_) => {
                    buf.push(byte[0]);
                    if buf.ends_with(b"\r\n") {
                        return Ok(String::from_utf8_lossy(&buf).to_string());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Send one tagged command and collect response lines up to the tagged
    /// completion line.
    fn send_cmd(&mut self, cmd: &str) -> Result<Vec<String>, MailboxError> {
        let tag = self.next_tag();
        let full = format!("{tag} {cmd}\r\n");
        IoWrite::write_all(&mut self.tls, full.as_bytes())?;
        IoWrite::flush(&mut self.tls)?;

        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            let done = line.starts_with(&tag);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }
}

impl MailboxSession for ImapSession {
    fn fetch_unseen(&mut self) -> Result<Vec<InboundMessage>, MailboxError> {
        let search = self.send_cmd("SEARCH UNSEEN")?;
        ensure_ok(&search, "SEARCH UNSEEN")?;
        let ids = parse_search_ids(&search);

        let mut results = Vec::new();
        for id in ids {
            // PEEK keeps the message unseen for the subject's own client.
            let fetch = self.send_cmd(&format!("FETCH {id} (BODY.PEEK[])"))?;
            if let Err(error) = ensure_ok(&fetch, "FETCH") {
                tracing::warn!(id = %id, %error, "Fetch refused by server, skipping message");
                continue;
            }
            let raw = unwrap_fetch_literal(&fetch);

            let Some(parsed) = MessageParser::default().parse(raw.as_bytes()) else {
                tracing::warn!(id = %id, "Skipping unparsable message");
                continue;
            };

            let sender = message::extract_sender(&parsed);
            if message::is_self_sender(&sender, &self.account) {
                tracing::debug!(id = %id, sender = %sender, "Skipping self-originated message");
                continue;
            }

            results.push(InboundMessage {
                id,
                subject: message::extract_subject(&parsed),
                sender,
                body: message::extract_body(&parsed),
            });
        }

        Ok(results)
    }

    fn quarantine(&mut self, id: &str) -> Result<(), MailboxError> {
        // Gmail strategy: spam label, then schedule deletion. The actual
        // removal happens in the batched expunge at close.
        let label = self.send_cmd(&format!("STORE {id} +X-GM-LABELS (\\Spam)"))?;
        ensure_ok(&label, "STORE +X-GM-LABELS")?;

        let flag = self.send_cmd(&format!("STORE {id} +FLAGS (\\Deleted)"))?;
        ensure_ok(&flag, "STORE +FLAGS")?;

        Ok(())
    }

    fn close(mut self, expunge: bool) -> Result<(), MailboxError> {
        if expunge {
            let expunge = self.send_cmd("EXPUNGE")?;
            ensure_ok(&expunge, "EXPUNGE")?;
        }
        let _ = self.send_cmd("LOGOUT");
        Ok(())
    }
}

// ── Response parsing (public for testing) ───────────────────────────

/// Whether the tagged completion line reports OK.
pub fn is_ok_response(lines: &[String]) -> bool {
    lines.last().is_some_and(|l| l.contains("OK"))
}

fn ensure_ok(lines: &[String], command: &str) -> Result<(), MailboxError> {
    if is_ok_response(lines) {
        Ok(())
    } else {
        Err(MailboxError::Protocol {
            command: command.to_string(),
            reason: lines.last().cloned().unwrap_or_default().trim().to_string(),
        })
    }
}

/// Extract message ids from `* SEARCH ...` response lines, in listing order.
pub fn parse_search_ids(lines: &[String]) -> Vec<String> {
    let mut ids = Vec::new();
    for line in lines {
        if line.starts_with("* SEARCH") {
            ids.extend(line.split_whitespace().skip(2).map(str::to_string));
        }
    }
    ids
}

/// Strip the FETCH envelope (untagged intro line, closing paren, tagged
/// completion) and rejoin the literal message text.
pub fn unwrap_fetch_literal(lines: &[String]) -> String {
    lines
        .iter()
        .skip(1)
        .take(lines.len().saturating_sub(3))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| format!("{s}\r\n")).collect()
    }

    #[test]
    fn search_ids_in_listing_order() {
        let resp = lines(&["* SEARCH 3 7 12", "A3 OK SEARCH completed"]);
        assert_eq!(parse_search_ids(&resp), vec!["3", "7", "12"]);
    }

    #[test]
    fn search_ids_empty_when_no_matches() {
        let resp = lines(&["* SEARCH", "A3 OK SEARCH completed"]);
        assert!(parse_search_ids(&resp).is_empty());
    }

    #[test]
    fn search_ids_across_multiple_untagged_lines() {
        let resp = lines(&["* SEARCH 1 2", "* SEARCH 9", "A3 OK done"]);
        assert_eq!(parse_search_ids(&resp), vec!["1", "2", "9"]);
    }

    #[test]
    fn ok_response_detection() {
        assert!(is_ok_response(&lines(&["* SEARCH", "A1 OK done"])));
        assert!(!is_ok_response(&lines(&["A1 NO [AUTHENTICATIONFAILED]"])));
        assert!(!is_ok_response(&[]));
    }

    #[test]
    fn refused_fetch_surfaces_protocol_error() {
        let resp = lines(&["A4 NO [EXPUNGEISSUED] Some messages expunged"]);
        let err = ensure_ok(&resp, "FETCH").unwrap_err();
        match err {
            MailboxError::Protocol { command, reason } => {
                assert_eq!(command, "FETCH");
                assert!(reason.contains("EXPUNGEISSUED"));
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn fetch_literal_strips_envelope() {
        let resp = lines(&[
            "* 1 FETCH (BODY[] {42}",
            "From: a@b.com",
            "Subject: hi",
            ")",
            "A4 OK FETCH completed",
        ]);
        let raw = unwrap_fetch_literal(&resp);
        assert!(raw.contains("From: a@b.com"));
        assert!(raw.contains("Subject: hi"));
        assert!(!raw.contains("FETCH completed"));
    }
}
