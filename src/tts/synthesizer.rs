//! Best-effort speech synthesis to a file.
//!
//! [`SpeechSynthesizer::synthesize`] creates an engine, sets the speaking
//! rate, picks a preferred voice when one is installed, and writes audio to
//! the requested path.  Every failure is logged and reported as `false`; it
//! never propagates.

use std::path::Path;
use std::sync::Arc;

use crate::config::TtsConfig;
use crate::tts::engine::{EspeakFactory, SpeechEngineFactory, TtsError, Voice};

/// Picks the first voice matching any marker, scanning voices in engine
/// order.  `None` means "keep the engine default".
pub fn select_voice<'a>(voices: &'a [Voice], markers: &[String]) -> Option<&'a Voice> {
    voices
        .iter()
        .find(|v| markers.iter().any(|m| v.matches(m)))
}

/// Request-scoped speech synthesis over a shared engine factory.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    factory: Arc<dyn SpeechEngineFactory>,
    rate_wpm: u32,
    preferred_voice_markers: Vec<String>,
}

impl SpeechSynthesizer {
    pub fn new(
        factory: Arc<dyn SpeechEngineFactory>,
        rate_wpm: u32,
        preferred_voice_markers: Vec<String>,
    ) -> Self {
        Self {
            factory,
            rate_wpm,
            preferred_voice_markers,
        }
    }

    /// `espeak-ng`-backed synthesizer from config.
    pub fn from_config(config: &TtsConfig) -> Self {
        Self::new(
            Arc::new(EspeakFactory::new(config.program.clone())),
            config.rate_wpm,
            config.preferred_voice_markers.clone(),
        )
    }

    /// Synthesize `text` into `output_path`.
    ///
    /// Returns `true` when the audio file was written.  On `false` no file is
    /// guaranteed (a previous one may still be present).
    pub fn synthesize(&self, text: &str, output_path: &Path) -> bool {
        match self.try_synthesize(text, output_path) {
            Ok(()) => {
                log::debug!("synthesized {} chars to {}", text.len(), output_path.display());
                true
            }
            Err(e) => {
                log::warn!("speech synthesis failed: {e}");
                false
            }
        }
    }

    fn try_synthesize(&self, text: &str, output_path: &Path) -> Result<(), TtsError> {
        let mut engine = self.factory.create()?;
        engine.set_rate(self.rate_wpm);

        let voices = engine.voices()?;
        match select_voice(&voices, &self.preferred_voice_markers) {
            Some(voice) => {
                log::debug!("using voice {} ({})", voice.name, voice.language);
                engine.set_voice(voice);
            }
            None => log::debug!("no preferred voice installed; using engine default"),
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        engine.save_to_file(text, output_path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
