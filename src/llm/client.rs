//! Core `TextGenerator` trait and the `GeminiClient` implementation.
//!
//! `GeminiClient` calls the `generateContent` REST endpoint of the Gemini
//! API.  All connection details come from [`LlmConfig`]; the API key is read
//! from the environment and its absence is reported on the first call, not at
//! construction.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::LlmConfig;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur during a generation call.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The provider rejected the call because of concurrency or quota limits.
    #[error("rate limited (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },

    /// Missing or rejected API key.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// Any other non-success HTTP status.
    #[error("generation API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse generation response: {0}")]
    Parse(String),

    /// The provider returned no usable text.
    #[error("generation API returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    /// `true` for transient concurrency / rate-limit conditions that are
    /// worth retrying after a short pause.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Map a non-success HTTP response to an error variant.
    ///
    /// `body` is the raw response body; the provider's `error.message` and
    /// `error.status` are used when it parses as a Google API error envelope.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .map(|e| e.error);

        let provider_status = detail
            .as_ref()
            .and_then(|d| d.status.as_deref())
            .unwrap_or("");

        let message = detail
            .as_ref()
            .and_then(|d| d.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string());

        match (status, provider_status) {
            (429, _) | (_, "RESOURCE_EXHAUSTED") => LlmError::RateLimited { status, message },
            (401 | 403, _) | (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => {
                LlmError::Unauthorized(message)
            }
            _ => LlmError::Status { status, message },
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for a single call to a text-generation service.
///
/// Implementors make exactly one attempt per call; retry policy lives in
/// [`GenerationClient`](crate::llm::GenerationClient).  Must be
/// `Send + Sync` so it can be held as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/v1beta/{model}:generateContent`.
pub struct GeminiClient {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Build a client from config, reading the API key from the environment
    /// variable named by `config.api_key_env`.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config, config.api_key())
    }

    /// Build a client with an explicit key.  `None` makes every call fail
    /// with [`LlmError::Unauthorized`].
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        if api_key.is_none() {
            log::warn!(
                "{} is not set; generation requests will fail until it is provided",
                config.api_key_env
            );
        }

        Self {
            client,
            config: config.clone(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            LlmError::Unauthorized(format!("{} is not set", self.config.api_key_env))
        })?;

        let body = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), &text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        parsed.into_text().ok_or(LlmError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// MockGenerator  (test-only)
// ---------------------------------------------------------------------------

/// A scripted test double: each call pops the next queued result and bumps a
/// call counter.  Once the script runs out every call returns
/// [`LlmError::EmptyResponse`].
#[cfg(test)]
pub struct MockGenerator {
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, LlmError>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockGenerator {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Succeeds once with `text`, then returns `EmptyResponse`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    /// A rate-limit error as the provider would report it.
    pub fn rate_limited() -> LlmError {
        LlmError::RateLimited {
            status: 429,
            message: "Resource has been exhausted".into(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn make_config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.into(),
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    fn success_body(parts: &[&str]) -> serde_json::Value {
        let parts: Vec<_> = parts.iter().map(|t| serde_json::json!({ "text": t })).collect();
        serde_json::json!({
            "candidates": [
                { "content": { "role": "model", "parts": parts } }
            ]
        })
    }

    fn error_body(code: u16, status: &str, message: &str) -> serde_json::Value {
        serde_json::json!({
            "error": { "code": code, "message": message, "status": status }
        })
    }

    #[test]
    fn classifies_429_as_rate_limited() {
        let body = error_body(429, "RESOURCE_EXHAUSTED", "Resource has been exhausted");
        let err = LlmError::from_status(429, &body.to_string());
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("Resource has been exhausted"));
    }

    #[test]
    fn classifies_resource_exhausted_status_as_rate_limited() {
        let body = error_body(503, "RESOURCE_EXHAUSTED", "too many concurrent requests");
        assert!(LlmError::from_status(503, &body.to_string()).is_rate_limited());
    }

    #[test]
    fn classifies_403_as_unauthorized() {
        let body = error_body(403, "PERMISSION_DENIED", "API key not valid");
        let err = LlmError::from_status(403, &body.to_string());
        assert!(matches!(err, LlmError::Unauthorized(ref m) if m == "API key not valid"));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn non_json_body_is_kept_as_message() {
        let err = LlmError::from_status(500, "  upstream exploded  ");
        match err {
            LlmError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn TextGenerator> =
            Box::new(GeminiClient::new(&LlmConfig::default(), Some("k".into())));
        drop(client);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        // Unroutable base URL: the call must short-circuit before sending.
        let client = GeminiClient::new(&make_config("http://127.0.0.1:9"), None);
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, LlmError::Unauthorized(ref m) if m.contains("GOOGLE_API_KEY")));
    }

    #[tokio::test]
    async fn joins_text_parts_of_first_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body(&["**Gravity** pulls ", "things down."])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&make_config(&server.uri()), Some("test-key".into()));
        let text = client.generate("Explain gravity").await.unwrap();
        assert_eq!(text, "**Gravity** pulls things down.");
    }

    #[tokio::test]
    async fn http_429_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(error_body(
                429,
                "RESOURCE_EXHAUSTED",
                "Resource has been exhausted (e.g. check quota).",
            )))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&make_config(&server.uri()), Some("k".into()));
        let err = client.generate("x").await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn http_400_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(error_body(
                400,
                "INVALID_ARGUMENT",
                "Request contains an invalid argument.",
            )))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&make_config(&server.uri()), Some("k".into()));
        let err = client.generate("x").await.unwrap_err();
        assert!(!err.is_rate_limited());
        assert!(matches!(err, LlmError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn empty_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new(&make_config(&server.uri()), Some("k".into()));
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn mock_generator_follows_script_and_counts() {
        let mock = MockGenerator::new(vec![Err(MockGenerator::rate_limited()), Ok("done".into())]);
        assert!(mock.generate("p").await.unwrap_err().is_rate_limited());
        assert_eq!(mock.generate("p").await.unwrap(), "done");
        assert!(matches!(mock.generate("p").await, Err(LlmError::EmptyResponse)));
        assert_eq!(mock.calls(), 3);
    }
}
