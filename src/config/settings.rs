//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across request
//! handlers.  The generation API key is deliberately absent: it is read from
//! the environment at call time (see [`LlmConfig::api_key`]).

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// OutputMode
// ---------------------------------------------------------------------------

/// Selects how much post-processing a generated explanation receives.
///
/// | Variant  | Rendering                       | Audio |
/// |----------|---------------------------------|-------|
/// | Plain    | escaped text, line breaks kept  | No    |
/// | Markdown | markdown → HTML                 | No    |
/// | Speech   | markdown → HTML                 | Yes   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// Show the raw generated text.
    Plain,
    /// Render markdown to HTML.
    Markdown,
    /// Render markdown and synthesize the explanation to an audio file.
    Speech,
}

impl Default for OutputMode {
    fn default() -> Self {
        Self::Speech
    }
}

impl OutputMode {
    /// `true` when this mode renders markdown instead of plain text.
    pub fn renders_markdown(self) -> bool {
        matches!(self, OutputMode::Markdown | OutputMode::Speech)
    }

    /// `true` when this mode produces audio.
    pub fn speaks(self) -> bool {
        self == OutputMode::Speech
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Directory served under `/static` (audio output lives below it).
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 10_000,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the text-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generation API (no trailing slash).
    pub base_url: String,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
    /// Model resource name, e.g. `"models/gemini-1.5-flash"`.
    pub model: String,
    /// Maximum seconds to wait for a single generation call.
    pub timeout_secs: u64,
    /// Total attempts per prompt, including the first one.
    pub max_attempts: u32,
    /// Flat delay between attempts after a rate-limit error.
    pub retry_delay_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key_env: "GOOGLE_API_KEY".into(),
            model: "models/gemini-1.5-flash".into(),
            timeout_secs: 60,
            max_attempts: 3,
            retry_delay_secs: 3,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the environment.
    ///
    /// Returns `None` when the variable is unset or blank.  Absence is not an
    /// error here; the generation client reports it on first use.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the local speech synthesis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Engine executable (`espeak-ng` or a compatible `espeak`).
    pub program: String,
    /// Speaking rate in words per minute.
    pub rate_wpm: u32,
    /// Case-insensitive substrings matched against voice names and language
    /// tags; the first matching voice wins.
    pub preferred_voice_markers: Vec<String>,
    /// Where the synthesized audio is written (overwritten on each request).
    pub output_file: PathBuf,
    /// URL path under which the web layer serves `output_file`.
    pub public_path: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".into(),
            rate_wpm: 130,
            preferred_voice_markers: vec!["en-in".into(), "india".into()],
            output_file: PathBuf::from("static/audio/output.wav"),
            public_path: "/static/audio/output.wav".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use topic_explainer::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rendering / audio mode.
    pub output_mode: OutputMode,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Generation service settings.
    pub llm: LlmConfig,
    /// Speech synthesis settings.
    pub tts: TtsConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.output_mode, loaded.output_mode);
        assert_eq!(original.server.port, loaded.server.port);
        assert_eq!(original.server.static_dir, loaded.server.static_dir);
        assert_eq!(original.llm.model, loaded.llm.model);
        assert_eq!(original.llm.max_attempts, loaded.llm.max_attempts);
        assert_eq!(original.llm.retry_delay_secs, loaded.llm.retry_delay_secs);
        assert_eq!(original.tts.rate_wpm, loaded.tts.rate_wpm);
        assert_eq!(
            original.tts.preferred_voice_markers,
            loaded.tts.preferred_voice_markers
        );
        assert_eq!(original.tts.output_file, loaded.tts.output_file);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.output_mode, OutputMode::Speech);
        assert_eq!(config.llm.model, "models/gemini-1.5-flash");
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.server.port, 10_000);
        assert_eq!(cfg.server.bind_addr(), "127.0.0.1:10000");
        assert_eq!(cfg.llm.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(cfg.llm.max_attempts, 3);
        assert_eq!(cfg.llm.retry_delay_secs, 3);
        assert_eq!(cfg.tts.rate_wpm, 130);
        assert_eq!(cfg.tts.public_path, "/static/audio/output.wav");
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.output_mode = OutputMode::Plain;
        cfg.server.port = 8080;
        cfg.llm.model = "models/gemini-1.5-pro".into();
        cfg.llm.max_attempts = 5;
        cfg.tts.program = "espeak".into();
        cfg.tts.preferred_voice_markers = vec!["en-gb".into()];

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.output_mode, OutputMode::Plain);
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.llm.model, "models/gemini-1.5-pro");
        assert_eq!(loaded.llm.max_attempts, 5);
        assert_eq!(loaded.tts.program, "espeak");
        assert_eq!(loaded.tts.preferred_voice_markers, vec!["en-gb".to_string()]);
    }

    #[test]
    fn output_mode_capabilities() {
        assert!(!OutputMode::Plain.renders_markdown());
        assert!(!OutputMode::Plain.speaks());
        assert!(OutputMode::Markdown.renders_markdown());
        assert!(!OutputMode::Markdown.speaks());
        assert!(OutputMode::Speech.renders_markdown());
        assert!(OutputMode::Speech.speaks());
    }

    #[test]
    fn api_key_reads_named_variable() {
        let mut cfg = LlmConfig::default();
        cfg.api_key_env = "TOPIC_EXPLAINER_TEST_KEY_PRESENT".into();
        std::env::set_var(&cfg.api_key_env, "  abc123  ");
        assert_eq!(cfg.api_key().as_deref(), Some("abc123"));

        cfg.api_key_env = "TOPIC_EXPLAINER_TEST_KEY_ABSENT".into();
        std::env::remove_var(&cfg.api_key_env);
        assert!(cfg.api_key().is_none());
    }
}
