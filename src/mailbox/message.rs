//! Inbound message normalization helpers.

use mail_parser::Message;

/// One fetched message, scoped to a single cycle. Never persisted as-is;
/// only quarantined messages leave a trace in the event log.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Opaque mailbox handle (IMAP sequence number), valid for this session.
    pub id: String,
    pub subject: String,
    pub sender: String,
    /// First non-attachment plain-text body part; empty if none.
    pub body: String,
}

/// Anti-feedback-loop filter: does the sender header refer to the monitored
/// account? Case-insensitive *contains*, so display-name forms like
/// `"Me" <user@example.com>` are caught too.
pub fn is_self_sender(sender: &str, account: &str) -> bool {
    sender.to_lowercase().contains(&account.to_lowercase())
}

/// Extract the sender address from a parsed message.
pub fn extract_sender(parsed: &Message) -> String {
    parsed
        .from()
        .and_then(|addr| addr.first())
        .and_then(|a| a.address())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".into())
}

/// Decoded subject header, or a placeholder when absent.
pub fn extract_subject(parsed: &Message) -> String {
    parsed.subject().unwrap_or("(no subject)").to_string()
}

/// Plain-text body, or empty string when the message has none.
pub fn extract_body(parsed: &Message) -> String {
    parsed
        .body_text(0)
        .map(|text| text.to_string())
        .unwrap_or_default()
}

/// Body snippet for the event log, capped at `max` characters.
pub fn snippet(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_parser::MessageParser;

    const ACCOUNT: &str = "watched@example.com";

    #[test]
    fn self_sender_exact_match() {
        assert!(is_self_sender("watched@example.com", ACCOUNT));
    }

    #[test]
    fn self_sender_contains_match() {
        assert!(is_self_sender("\"Me\" <watched@example.com>", ACCOUNT));
    }

    #[test]
    fn self_sender_case_insensitive() {
        assert!(is_self_sender("WATCHED@Example.COM", ACCOUNT));
    }

    #[test]
    fn other_sender_passes_filter() {
        assert!(!is_self_sender("attacker@evil.com", ACCOUNT));
    }

    #[test]
    fn snippet_caps_length() {
        let body = "x".repeat(500);
        assert_eq!(snippet(&body, 200).chars().count(), 200);
    }

    #[test]
    fn snippet_short_body_unchanged() {
        assert_eq!(snippet("hello", 200), "hello");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(snippet(&body, 200).chars().count(), 200);
    }

    #[test]
    fn parse_subject_sender_and_body() {
        let raw = "From: Alice <alice@example.com>\r\n\
                   To: watched@example.com\r\n\
                   Subject: Hello\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   Hi there\r\n";
        let parsed = MessageParser::default().parse(raw.as_bytes()).unwrap();
        assert_eq!(extract_sender(&parsed), "alice@example.com");
        assert_eq!(extract_subject(&parsed), "Hello");
        assert!(extract_body(&parsed).contains("Hi there"));
    }

    #[test]
    fn missing_subject_gets_placeholder() {
        let raw = "From: alice@example.com\r\n\r\nbody\r\n";
        let parsed = MessageParser::default().parse(raw.as_bytes()).unwrap();
        assert_eq!(extract_subject(&parsed), "(no subject)");
    }
}
