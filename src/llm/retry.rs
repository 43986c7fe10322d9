//! Retrying generation client. Wraps any [`TextGenerator`] and never errors.
//!
//! [`GenerationClient`] makes up to [`RetryPolicy::max_attempts`] calls.  A
//! rate-limit error with attempts remaining waits a flat
//! [`RetryPolicy::delay`] and tries again; every other error, or running out
//! of attempts, becomes [`GenerationResult::Failure`] carrying the
//! stringified error.

use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::llm::client::TextGenerator;

// ---------------------------------------------------------------------------
// GenerationResult
// ---------------------------------------------------------------------------

/// Outcome of a generation request after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// Generated text.
    Success(String),
    /// Human-readable error message.
    Failure(String),
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success(_))
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Fixed-count, flat-delay retry policy.  No jitter, no growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first.  Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationClient
// ---------------------------------------------------------------------------

/// Applies [`RetryPolicy`] around a single-attempt [`TextGenerator`].
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use topic_explainer::config::LlmConfig;
/// use topic_explainer::llm::{GeminiClient, GenerationClient, RetryPolicy};
///
/// let backend = Arc::new(GeminiClient::from_config(&LlmConfig::default()));
/// let client = GenerationClient::new(backend, RetryPolicy::default());
/// // `client.generate(prompt).await` always yields a GenerationResult.
/// ```
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Generate text for `prompt`, retrying on rate limits.
    ///
    /// This method **never** returns an error; failures are folded into
    /// [`GenerationResult::Failure`].
    pub async fn generate(&self, prompt: &str) -> GenerationResult {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.backend.generate(prompt).await {
                Ok(text) => {
                    log::debug!("generation succeeded on attempt {attempt}");
                    return GenerationResult::Success(text);
                }
                Err(e) if e.is_rate_limited() && attempt < max_attempts => {
                    log::warn!(
                        "generation rate limited on attempt {attempt}/{max_attempts}: {e}; \
                         retrying in {:?}",
                        self.policy.delay
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("generation failed on attempt {attempt}/{max_attempts}: {e}");
                    return GenerationResult::Failure(e.to_string());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::{LlmError, MockGenerator};

    fn client_for(mock: &Arc<MockGenerator>) -> GenerationClient {
        GenerationClient::new(mock.clone(), RetryPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_retry() {
        let mock = Arc::new(MockGenerator::ok("hello"));
        let start = tokio::time::Instant::now();

        let result = client_for(&mock).generate("p").await;

        assert_eq!(result, GenerationResult::Success("hello".into()));
        assert_eq!(mock.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_twice_then_success_uses_three_attempts() {
        let mock = Arc::new(MockGenerator::new(vec![
            Err(MockGenerator::rate_limited()),
            Err(MockGenerator::rate_limited()),
            Ok("third time lucky".into()),
        ]));
        let start = tokio::time::Instant::now();

        let result = client_for(&mock).generate("p").await;

        assert_eq!(result, GenerationResult::Success("third time lucky".into()));
        assert_eq!(mock.calls(), 3);
        let waited = start.elapsed();
        assert!(
            waited >= Duration::from_secs(6) && waited < Duration::from_secs(7),
            "{waited:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_exhausts_budget_and_fails() {
        let mock = Arc::new(MockGenerator::new(vec![
            Err(MockGenerator::rate_limited()),
            Err(MockGenerator::rate_limited()),
            Err(MockGenerator::rate_limited()),
            Ok("never reached".into()),
        ]));

        let result = client_for(&mock).generate("p").await;

        assert_eq!(mock.calls(), 3);
        match result {
            GenerationResult::Failure(msg) => assert!(msg.contains("rate limited")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let mock = Arc::new(MockGenerator::new(vec![
            Err(LlmError::Status {
                status: 400,
                message: "bad prompt".into(),
            }),
            Ok("never reached".into()),
        ]));
        let start = tokio::time::Instant::now();

        let result = client_for(&mock).generate("p").await;

        assert_eq!(mock.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(
            result,
            GenerationResult::Failure("generation API returned HTTP 400: bad prompt".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_other_error_stops() {
        let mock = Arc::new(MockGenerator::new(vec![
            Err(MockGenerator::rate_limited()),
            Err(LlmError::Timeout),
        ]));

        let result = client_for(&mock).generate("p").await;

        assert_eq!(mock.calls(), 2);
        assert_eq!(
            result,
            GenerationResult::Failure("generation request timed out".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_calls_once() {
        let mock = Arc::new(MockGenerator::new(vec![Err(MockGenerator::rate_limited())]));
        let client = GenerationClient::new(
            mock.clone(),
            RetryPolicy {
                max_attempts: 0,
                delay: Duration::from_secs(3),
            },
        );

        assert!(!client.generate("p").await.is_success());
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn policy_from_config() {
        let cfg = LlmConfig {
            max_attempts: 4,
            retry_delay_secs: 1,
            ..LlmConfig::default()
        };
        let policy = RetryPolicy::from_config(&cfg);
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }
}
