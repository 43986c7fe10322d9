//! Request pipeline: topic → prompt → generation → render → speech.
//!
//! # Pipeline flow
//!
//! ```text
//! raw topic
//!   └─▶ trim; empty → PipelineOutcome::empty()          (no external calls)
//!         └─▶ PromptBuilder::build
//!               └─▶ GenerationClient::generate           (≤ 3 attempts)
//!                     ├─ Failure(msg) → error fragment, no audio
//!                     └─ Success(text)
//!                           ├─▶ render (plain / markdown)
//!                           └─▶ [Speech] sanitize → spawn_blocking(synthesize)
//!                                 ├─ true  → audio_path = public path
//!                                 └─ false → audio_path = None
//! ```
//!
//! The pipeline holds no per-request state, so one instance is shared by all
//! request handlers.  Audio always goes to the same configured file; a later
//! request overwrites an earlier one.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{AppConfig, OutputMode, TtsConfig};
use crate::llm::{GeminiClient, GenerationClient, GenerationResult, PromptBuilder, RetryPolicy};
use crate::text::{render_error, render_markdown, render_plain, sanitize_for_speech};
use crate::tts::SpeechSynthesizer;

use super::outcome::{PipelineOutcome, RenderedResponse, Topic};

// ---------------------------------------------------------------------------
// AudioTarget
// ---------------------------------------------------------------------------

/// Where synthesized audio is written and how clients reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTarget {
    /// Filesystem path written by the synthesizer.
    pub file: PathBuf,
    /// URL path served by the web layer for `file`.
    pub public_path: String,
}

impl AudioTarget {
    pub fn from_config(config: &TtsConfig) -> Self {
        Self {
            file: config.output_file.clone(),
            public_path: config.public_path.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestPipeline
// ---------------------------------------------------------------------------

/// Handles one topic request end to end.
///
/// ```rust,no_run
/// use topic_explainer::config::AppConfig;
/// use topic_explainer::pipeline::RequestPipeline;
///
/// # async fn example() {
/// let pipeline = RequestPipeline::from_config(&AppConfig::default());
/// let outcome = pipeline.handle("gravity").await;
/// if let Some(rendered) = outcome.rendered {
///     println!("{}", rendered.html());
/// }
/// # }
/// ```
pub struct RequestPipeline {
    prompt: PromptBuilder,
    generation: GenerationClient,
    synthesizer: SpeechSynthesizer,
    mode: OutputMode,
    audio: AudioTarget,
}

impl RequestPipeline {
    pub fn new(
        generation: GenerationClient,
        synthesizer: SpeechSynthesizer,
        mode: OutputMode,
        audio: AudioTarget,
    ) -> Self {
        Self {
            prompt: PromptBuilder::new(),
            generation,
            synthesizer,
            mode,
            audio,
        }
    }

    /// Production wiring: Gemini backend, `espeak-ng` synthesizer.
    pub fn from_config(config: &AppConfig) -> Self {
        let generation = GenerationClient::new(
            Arc::new(GeminiClient::from_config(&config.llm)),
            RetryPolicy::from_config(&config.llm),
        );
        Self::new(
            generation,
            SpeechSynthesizer::from_config(&config.tts),
            config.output_mode,
            AudioTarget::from_config(&config.tts),
        )
    }

    /// Run the pipeline for `raw_topic`.  Never fails; see module docs.
    pub async fn handle(&self, raw_topic: &str) -> PipelineOutcome {
        let Some(topic) = Topic::parse(raw_topic) else {
            log::debug!("pipeline: empty topic, nothing to do");
            return PipelineOutcome::empty();
        };

        log::info!("pipeline: explaining {:?}", topic.as_str());
        let prompt = self.prompt.build(topic.as_str());

        let text = match self.generation.generate(&prompt).await {
            GenerationResult::Success(text) => text,
            GenerationResult::Failure(message) => {
                return PipelineOutcome {
                    rendered: Some(RenderedResponse::error(render_error(&message))),
                    audio_path: None,
                };
            }
        };

        let html = if self.mode.renders_markdown() {
            render_markdown(&text)
        } else {
            render_plain(&text)
        };

        let audio_path = if self.mode.speaks() {
            self.speak(sanitize_for_speech(&text)).await
        } else {
            None
        };

        PipelineOutcome {
            rendered: Some(RenderedResponse::content(html)),
            audio_path,
        }
    }

    /// Synthesize on the blocking pool; `Some(public path)` on success.
    async fn speak(&self, text: String) -> Option<String> {
        let synthesizer = self.synthesizer.clone();
        let file = self.audio.file.clone();

        let written =
            tokio::task::spawn_blocking(move || synthesizer.synthesize(&text, &file)).await;

        match written {
            Ok(true) => Some(self.audio.public_path.clone()),
            Ok(false) => None,
            Err(e) => {
                log::warn!("pipeline: synthesis task panicked: {e}");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
