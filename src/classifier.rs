//! Threat classifier — delegates scoring of one message to an external
//! reasoning service and defensively parses its reply.
//!
//! Failures here must fail **open**: a flaky service or an unparsable reply
//! resolves to a zero-risk verdict, never to a quarantine.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::ClassifierConfig;
use crate::error::ClassifierError;

const OPENAI_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Fixed instruction for the reasoning service. Demands a single JSON object
/// with exactly the three verdict fields.
const CLASSIFIER_INSTRUCTIONS: &str = "You are a phishing detection AI.\n\n\
     You analyze an email (subject + body) and you MUST respond with ONLY a single JSON object:\n\
     {\n\
       \"phishing_score\": <integer 0-100>,\n\
       \"explanation\": \"why this is suspicious or safe\",\n\
       \"recommendation\": \"what the user should do\"\n\
     }\n\n\
     Guidance:\n\
     - Consider urgency, threats, emotional manipulation, unknown senders, suspicious URLs, mismatched domains.\n\
     - 0-30 = probably safe\n\
     - 31-70 = suspicious\n\
     - 71-100 = likely phishing.\n\
     - You will also be told USER_RISK (0-100). If USER_RISK is high (80+), \
     treat borderline emails more aggressively when assigning phishing_score.\n\
     DO NOT output anything except the JSON object. No prose, no backticks.";

/// Classification verdict for one message. Transient; becomes part of an
/// event log entry only if the message is quarantined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub phishing_score: u8,
    pub explanation: String,
    pub recommendation: String,
}

impl Verdict {
    /// Safe default used whenever the service fails or its reply cannot be
    /// parsed. Zero risk, so it can never cross any quarantine threshold.
    pub fn fail_open() -> Self {
        Self {
            phishing_score: 0,
            explanation: "Failed to parse classifier output; assuming safe.".to_string(),
            recommendation: "No action.".to_string(),
        }
    }

    /// Parse a raw service reply into a verdict.
    ///
    /// The reply is free text expected to contain exactly one JSON object;
    /// only the span from the first `{` to the last `}` is parsed, tolerating
    /// surrounding prose.
    pub fn parse(raw: &str) -> Result<Self, ClassifierError> {
        let start = raw
            .find('{')
            .ok_or_else(|| ClassifierError::Unparsable("no JSON object in reply".into()))?;
        let end = raw
            .rfind('}')
            .filter(|&end| end > start)
            .ok_or_else(|| ClassifierError::Unparsable("no JSON object in reply".into()))?;

        let parsed: RawVerdict = serde_json::from_str(&raw[start..=end])
            .map_err(|e| ClassifierError::Unparsable(e.to_string()))?;

        Ok(Self {
            phishing_score: parsed.phishing_score.clamp(0, 100) as u8,
            explanation: parsed.explanation,
            recommendation: parsed.recommendation,
        })
    }
}

/// Wire shape of the service reply. Missing fields degrade to safe values
/// rather than failing the parse.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    phishing_score: i64,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    recommendation: String,
}

/// Injectable classification capability. The production implementation calls
/// an external reasoning service; tests use deterministic stubs.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Score one message. Never fails: service and parse errors resolve to
    /// [`Verdict::fail_open`].
    async fn classify(&self, subject: &str, body: &str, risk: u8) -> Verdict;
}

/// Classifier backed by the OpenAI chat-completions API.
pub struct OpenAiClassifier {
    http: reqwest::Client,
    config: ClassifierConfig,
    endpoint: String,
}

impl OpenAiClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            endpoint: OPENAI_CHAT_ENDPOINT.to_string(),
        }
    }

    /// Single completion call; returns the raw assistant text.
    async fn complete(&self, prompt: &str) -> Result<String, ClassifierError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": CLASSIFIER_INSTRUCTIONS },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::RequestFailed {
                provider: "openai".into(),
                reason: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| ClassifierError::RequestFailed {
                provider: "openai".into(),
                reason: e.to_string(),
            })?;

        let completion: ChatCompletion =
            response
                .json()
                .await
                .map_err(|e| ClassifierError::RequestFailed {
                    provider: "openai".into(),
                    reason: format!("malformed completion payload: {e}"),
                })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ClassifierError::EmptyReply {
                provider: "openai".into(),
            })
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(&self, subject: &str, body: &str, risk: u8) -> Verdict {
        let prompt = build_prompt(subject, body, risk);

        let raw = match self.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Classifier call failed, failing open");
                return Verdict::fail_open();
            }
        };

        Verdict::parse(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, raw_reply = %raw, "Unparsable verdict, failing open");
            Verdict::fail_open()
        })
    }
}

/// Build the per-message prompt. The risk score is included so borderline
/// messages are scored more aggressively for high-risk subjects.
fn build_prompt(subject: &str, body: &str, risk: u8) -> String {
    let subject = if subject.is_empty() {
        "(no subject)"
    } else {
        subject
    };
    format!(
        "USER_RISK={risk}\n\n\
         Analyze the following email and respond ONLY with a JSON object as specified.\n\n\
         EMAIL:\n\
         Subject: {subject}\n\
         Body:\n{body}"
    )
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_json() {
        let verdict = Verdict::parse(
            r#"{"phishing_score": 85, "explanation": "urgent tone", "recommendation": "delete"}"#,
        )
        .unwrap();
        assert_eq!(verdict.phishing_score, 85);
        assert_eq!(verdict.explanation, "urgent tone");
        assert_eq!(verdict.recommendation, "delete");
    }

    #[test]
    fn parse_json_wrapped_in_prose() {
        let raw = "Sure, here is my analysis:\n\
                   {\"phishing_score\": 42, \"explanation\": \"meh\", \"recommendation\": \"watch\"}\n\
                   Let me know if you need more.";
        let verdict = Verdict::parse(raw).unwrap();
        assert_eq!(verdict.phishing_score, 42);
    }

    #[test]
    fn parse_empty_reply_is_error() {
        assert!(Verdict::parse("").is_err());
    }

    #[test]
    fn parse_non_json_is_error() {
        assert!(Verdict::parse("this email looks fine to me").is_err());
        assert!(Verdict::parse("score: 90 out of 100 }{").is_err());
    }

    #[test]
    fn parse_missing_fields_degrades_to_safe_values() {
        let verdict = Verdict::parse(r#"{"explanation": "no score given"}"#).unwrap();
        assert_eq!(verdict.phishing_score, 0);
        assert_eq!(verdict.recommendation, "");
    }

    #[test]
    fn parse_clamps_out_of_range_scores() {
        let verdict = Verdict::parse(r#"{"phishing_score": 900}"#).unwrap();
        assert_eq!(verdict.phishing_score, 100);
        let verdict = Verdict::parse(r#"{"phishing_score": -5}"#).unwrap();
        assert_eq!(verdict.phishing_score, 0);
    }

    #[test]
    fn fail_open_verdict_is_zero_risk() {
        assert_eq!(Verdict::fail_open().phishing_score, 0);
    }

    #[test]
    fn prompt_includes_risk_and_subject() {
        let prompt = build_prompt("Verify account", "click here", 75);
        assert!(prompt.contains("USER_RISK=75"));
        assert!(prompt.contains("Subject: Verify account"));
        assert!(prompt.contains("click here"));
    }

    #[test]
    fn prompt_defaults_empty_subject() {
        let prompt = build_prompt("", "body", 10);
        assert!(prompt.contains("Subject: (no subject)"));
    }
}
