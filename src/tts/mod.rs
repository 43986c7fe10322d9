//! Text-to-speech module.
//!
//! # Architecture
//!
//! ```text
//! SpeechSynthesizer::synthesize(text, path) -> bool
//!        │
//!        ├─ SpeechEngineFactory::create()     fresh engine per call
//!        ├─ SpeechEngine::set_rate(wpm)
//!        ├─ SpeechEngine::voices() → select_voice(markers) → set_voice
//!        └─ SpeechEngine::save_to_file(text, path)
//! ```
//!
//! Any error along the way is logged and turned into `false`.

pub mod engine;
pub mod synthesizer;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::{
    parse_voice_list, EspeakEngine, EspeakFactory, SpeechEngine, SpeechEngineFactory, TtsError,
    Voice,
};
pub use synthesizer::{select_voice, SpeechSynthesizer};

// test-only re-exports so the pipeline tests can build a synthesizer without
// reaching into `tts::engine`.
#[cfg(test)]
pub use engine::{voice, FailAt, MockEngineFactory};
