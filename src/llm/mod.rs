//! Text-generation module.
//!
//! This module provides:
//! * [`PromptBuilder`]: wraps a topic in the explanation instruction.
//! * [`TextGenerator`]: async trait for one call to a generation service.
//! * [`GeminiClient`]: Gemini `generateContent` REST backend.
//! * [`GenerationClient`]: retries rate-limited calls, never errors.
//! * [`GenerationResult`]: success / failure outcome.
//! * [`LlmError`]: error variants for a single call.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use topic_explainer::config::AppConfig;
//! use topic_explainer::llm::{
//!     GeminiClient, GenerationClient, GenerationResult, PromptBuilder, RetryPolicy,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let client = GenerationClient::new(
//!         Arc::new(GeminiClient::from_config(&config.llm)),
//!         RetryPolicy::from_config(&config.llm),
//!     );
//!
//!     let prompt = PromptBuilder::new().build("rainbows");
//!     match client.generate(&prompt).await {
//!         GenerationResult::Success(text) => println!("{text}"),
//!         GenerationResult::Failure(msg) => eprintln!("{msg}"),
//!     }
//! }
//! ```

pub mod client;
pub mod prompt;
pub mod retry;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{GeminiClient, LlmError, TextGenerator};
pub use prompt::PromptBuilder;
pub use retry::{GenerationClient, GenerationResult, RetryPolicy};

#[cfg(test)]
pub use client::MockGenerator;
