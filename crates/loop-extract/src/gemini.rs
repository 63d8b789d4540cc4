//! Gemini implementation of [`FactExtractor`].
//!
//! One non-streaming `generateContent` call per capture. The API key travels
//! as the `key` query parameter and is stripped from every error and log
//! line. The request timeout applies to the whole exchange; exceeding it is
//! a transport failure.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loop_core::time::normalize;
use loop_core::{Capture, ContextFact};
use loop_settings::ExtractorSettings;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::{ExtractError, Result};
use crate::extractor::FactExtractor;
use crate::prompt::{EXTRACTION_PROMPT, render_capture};
use crate::response::{extract_text, parse_fact_payloads};

/// Longest slice of an error body kept in a transport error.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// REST base URL, without trailing slash.
    pub api_base: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    /// Build from settings. Fails if no API key is configured.
    pub fn from_settings(settings: &ExtractorSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ExtractError::Config {
                message: "no Gemini API key configured (set LOOP_GEMINI_API_KEY)".into(),
            })?;
        Ok(Self {
            api_key,
            model: settings.model.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(settings.timeout_ms),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Extractor
// ─────────────────────────────────────────────────────────────────────────────

/// Gemini-backed fact extractor.
pub struct GeminiExtractor {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiExtractor {
    /// Create an extractor with its own HTTP client.
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create an extractor with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: GeminiConfig, client: reqwest::Client) -> Self {
        debug!(model = %config.model, timeout = ?config.timeout, "Gemini extractor initialized");
        Self { config, client }
    }

    /// Model this extractor calls.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send the request and return the decoded envelope.
    async fn generate(&self, rendered: &str) -> Result<Value> {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: EXTRACTION_PROMPT }, Part { text: rendered }],
            }],
        };

        debug!(model = %self.model(), "sending generateContent request");
        let response = self
            .client
            .post(self.config.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(ExtractError::from_http)?;

        let status = response.status();
        let text = response.text().await.map_err(ExtractError::from_http)?;

        if !status.is_success() {
            let excerpt: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(ExtractError::Transport {
                message: format!("Gemini returned {status}: {excerpt}"),
                status: Some(status.as_u16()),
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ExtractError::malformed(format!("response body is not JSON: {e}")))
    }
}

#[async_trait]
impl FactExtractor for GeminiExtractor {
    #[instrument(skip_all, fields(capture_id = %capture.capture_id, model = %self.model()))]
    async fn extract(
        &self,
        capture: &Capture,
        request_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<ContextFact>> {
        let request_time = normalize(request_time.unwrap_or_else(Utc::now));
        let rendered = render_capture(capture);

        let result = async {
            let envelope = self.generate(&rendered).await?;
            let payloads = parse_fact_payloads(extract_text(&envelope)?)?;
            payloads
                .iter()
                .map(|p| {
                    ContextFact::from_payload(p, &capture.capture_id, Some(request_time))
                        .map_err(ExtractError::from)
                })
                .collect::<Result<Vec<_>>>()
        }
        .await;

        match &result {
            Ok(facts) => debug!(count = facts.len(), "facts extracted"),
            Err(e) => warn!(category = e.category(), error = %e, "extraction failed"),
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/v1beta/models/gemini-1.5-pro-latest:generateContent";

    fn config(server: &MockServer) -> GeminiConfig {
        GeminiConfig {
            api_key: "test".into(),
            model: "gemini-1.5-pro-latest".into(),
            api_base: format!("{}/v1beta", server.uri()),
            timeout: Duration::from_secs(5),
        }
    }

    fn envelope(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    fn capture() -> Capture {
        Capture::new("cap-123", "Let's meet Friday at 3pm in the downtown office")
            .with_source("call")
            .with_created_at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }

    fn request_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 8, 30, 0).unwrap()
    }

    async fn mount(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(query_param("key", "test"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn builds_prompt_and_parses_response() {
        let server = MockServer::start().await;
        let inner = json!({"facts": [{
            "category": "schedule",
            "detail": "Meeting with Alex",
            "time_range": "Friday 3pm",
            "location": "Downtown office",
            "confidence": 0.92
        }]})
        .to_string();
        mount(&server, ResponseTemplate::new(200).set_body_json(envelope(&inner))).await;

        let extractor = GeminiExtractor::new(config(&server));
        let facts = extractor.extract(&capture(), Some(request_time())).await.unwrap();

        assert_eq!(facts.len(), 1);
        let fact = &facts[0];
        assert_eq!(fact.category, "schedule");
        assert_eq!(fact.detail, "Meeting with Alex");
        assert_eq!(fact.time_range.as_deref(), Some("Friday 3pm"));
        assert_eq!(fact.location.as_deref(), Some("Downtown office"));
        assert!((fact.confidence - 0.92).abs() < f64::EPSILON);
        assert_eq!(fact.source_capture_id.as_str(), "cap-123");
        assert_eq!(fact.valid_from, Some(request_time()));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], EXTRACTION_PROMPT);
        assert!(parts[1]["text"]
            .as_str()
            .unwrap()
            .contains("Let's meet Friday at 3pm in the downtown office"));
    }

    #[tokio::test]
    async fn accepts_bare_list() {
        let server = MockServer::start().await;
        let inner = r#"[{"category": "reminder", "detail": "Bring slides"}, {"detail": "x"}]"#;
        mount(&server, ResponseTemplate::new(200).set_body_json(envelope(inner))).await;

        let facts = GeminiExtractor::new(config(&server))
            .extract(&capture(), Some(request_time()))
            .await
            .unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[1].category, "unspecified");
        assert!(facts.iter().all(|f| f.valid_from == Some(request_time())));
    }

    #[tokio::test]
    async fn missing_candidates_is_malformed() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_json(json!({"unexpected": true}))).await;

        let err = GeminiExtractor::new(config(&server))
            .extract(&capture(), None)
            .await
            .unwrap_err();
        assert_matches!(err, ExtractError::MalformedResponse { .. });
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

        let err = GeminiExtractor::new(config(&server))
            .extract(&capture(), None)
            .await
            .unwrap_err();
        assert_matches!(err, ExtractError::MalformedResponse { .. });
    }

    #[tokio::test]
    async fn non_numeric_confidence_is_validation_error() {
        let server = MockServer::start().await;
        let inner = r#"{"facts": [{"category": "schedule", "confidence": "very"}]}"#;
        mount(&server, ResponseTemplate::new(200).set_body_json(envelope(inner))).await;

        let err = GeminiExtractor::new(config(&server))
            .extract(&capture(), None)
            .await
            .unwrap_err();
        assert_matches!(err, ExtractError::Validation(_));
    }

    #[tokio::test]
    async fn server_error_is_retryable_transport() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(503).set_body_string("overloaded")).await;

        let err = GeminiExtractor::new(config(&server))
            .extract(&capture(), None)
            .await
            .unwrap_err();
        assert_matches!(err, ExtractError::Transport { status: Some(503), .. });
        assert!(err.is_retryable());
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn client_error_is_not_retryable() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(400).set_body_string("bad key")).await;

        let err = GeminiExtractor::new(config(&server))
            .extract(&capture(), None)
            .await
            .unwrap_err();
        assert_matches!(err, ExtractError::Transport { status: Some(400), .. });
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn timeout_is_transport_error() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(envelope("[]"))
                .set_delay(Duration::from_millis(500)),
        )
        .await;

        let mut cfg = config(&server);
        cfg.timeout = Duration::from_millis(50);
        let err = GeminiExtractor::new(cfg)
            .extract(&capture(), None)
            .await
            .unwrap_err();
        assert_matches!(err, ExtractError::Transport { status: None, .. });
        assert!(!err.to_string().contains("key=test"));
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let cfg = GeminiConfig {
            api_key: "secret".into(),
            model: "m".into(),
            api_base: "http://127.0.0.1:1".into(),
            timeout: Duration::from_secs(2),
        };
        let err = GeminiExtractor::new(cfg)
            .extract(&capture(), None)
            .await
            .unwrap_err();
        assert_matches!(err, ExtractError::Transport { status: None, .. });
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn config_requires_api_key() {
        let err = GeminiConfig::from_settings(&ExtractorSettings::default()).unwrap_err();
        assert_matches!(err, ExtractError::Config { .. });
    }

    #[test]
    fn config_from_settings() {
        let settings = ExtractorSettings {
            api_key: Some("k".into()),
            api_base: "http://localhost:8080/v1beta/".into(),
            timeout_ms: 1500,
            ..Default::default()
        };
        let cfg = GeminiConfig::from_settings(&settings).unwrap();
        assert_eq!(cfg.timeout, Duration::from_millis(1500));
        assert_eq!(
            cfg.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-1.5-pro-latest:generateContent"
        );
        assert!(!format!("{cfg:?}").contains("\"k\""));
    }
}
