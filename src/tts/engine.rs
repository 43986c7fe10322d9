//! Speech engine traits and the `espeak-ng` implementation.
//!
//! # Overview
//!
//! [`SpeechEngineFactory`] is held by the synthesizer and produces a fresh
//! [`SpeechEngine`] for every synthesis call; engines carry per-call settings
//! (rate, voice) and are dropped afterwards.
//!
//! [`EspeakFactory`] / [`EspeakEngine`] drive the `espeak-ng` command-line
//! tool.  [`MockEngineFactory`] (available under `#[cfg(test)]`) records what
//! it was asked to do and can be told to fail at any stage.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// All errors that can arise from the speech subsystem.
#[derive(Debug, Error)]
pub enum TtsError {
    /// The engine could not be started.
    #[error("speech engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Listing installed voices failed.
    #[error("could not list voices: {0}")]
    Voices(String),

    /// The engine ran but did not produce audio.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// An installed voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Identifier passed back to the engine to select this voice.
    pub id: String,
    /// Display name, e.g. `"English_(India)"`.
    pub name: String,
    /// Locale tag, e.g. `"en-in"`.
    pub language: String,
}

impl Voice {
    /// `true` when `marker` occurs (case-insensitively) in the name or
    /// language tag.
    pub fn matches(&self, marker: &str) -> bool {
        let marker = marker.to_lowercase();
        if marker.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&marker) || self.language.to_lowercase().contains(&marker)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// One engine instance, configured and used for a single synthesis.
pub trait SpeechEngine {
    /// Installed voices, in engine order.
    fn voices(&self) -> Result<Vec<Voice>, TtsError>;

    /// Speaking rate in words per minute.
    fn set_rate(&mut self, wpm: u32);

    fn set_voice(&mut self, voice: &Voice);

    /// Synthesize `text` into `path`, overwriting any existing file.
    fn save_to_file(&mut self, text: &str, path: &Path) -> Result<(), TtsError>;
}

/// Creates engine instances.  Shared across requests, so `Send + Sync`.
pub trait SpeechEngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn SpeechEngine>, TtsError>;
}

// Compile-time assertion: both traits must be object-safe.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechEngine>, _: Box<dyn SpeechEngineFactory>) {}
};

// ---------------------------------------------------------------------------
// espeak-ng
// ---------------------------------------------------------------------------

/// Builds [`EspeakEngine`]s for a given executable.
#[derive(Debug, Clone)]
pub struct EspeakFactory {
    program: String,
}

impl EspeakFactory {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SpeechEngineFactory for EspeakFactory {
    /// Checks that the executable runs (`--version`) before handing out an
    /// engine.
    fn create(&self) -> Result<Box<dyn SpeechEngine>, TtsError> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| TtsError::EngineUnavailable(format!("{}: {e}", self.program)))?;

        if !status.success() {
            return Err(TtsError::EngineUnavailable(format!(
                "{} --version exited with {status}",
                self.program
            )));
        }

        Ok(Box::new(EspeakEngine {
            program: self.program.clone(),
            rate: None,
            voice: None,
        }))
    }
}

/// A configured `espeak-ng` invocation.
#[derive(Debug)]
pub struct EspeakEngine {
    program: String,
    rate: Option<u32>,
    voice: Option<String>,
}

impl EspeakEngine {
    /// Arguments for writing `path`; text is fed on stdin.
    fn synth_args(&self, path: &Path) -> Vec<String> {
        let mut args = Vec::with_capacity(7);
        if let Some(rate) = self.rate {
            args.push("-s".to_string());
            args.push(rate.to_string());
        }
        if let Some(voice) = &self.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        args.push("-w".to_string());
        args.push(path.display().to_string());
        args.push("--stdin".to_string());
        args
    }
}

impl SpeechEngine for EspeakEngine {
    fn voices(&self) -> Result<Vec<Voice>, TtsError> {
        let output = Command::new(&self.program)
            .arg("--voices")
            .output()
            .map_err(|e| TtsError::Voices(e.to_string()))?;

        if !output.status.success() {
            return Err(TtsError::Voices(format!(
                "{} --voices exited with {}",
                self.program, output.status
            )));
        }

        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn set_rate(&mut self, wpm: u32) {
        self.rate = Some(wpm);
    }

    fn set_voice(&mut self, voice: &Voice) {
        self.voice = Some(voice.id.clone());
    }

    fn save_to_file(&mut self, text: &str, path: &Path) -> Result<(), TtsError> {
        let mut child = Command::new(&self.program)
            .args(self.synth_args(path))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TtsError::EngineUnavailable(format!("{}: {e}", self.program)))?;

        // Stdin is fed from its own thread while this one drains stderr, so a
        // chatty engine cannot stall on a full pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TtsError::Synthesis("engine stdin unavailable".into()))?;
        let input = text.to_owned();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| TtsError::Synthesis("stdin writer panicked".into()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::Synthesis(format!(
                "exit {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        written?;
        Ok(())
    }
}

/// Parse `espeak-ng --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)
/// ```
///
/// The language tag doubles as the voice id (`-v en-gb`).  The header line
/// and malformed rows are skipped.
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 || cols[0].parse::<u32>().is_err() {
                return None;
            }
            Some(Voice {
                id: cols[1].to_string(),
                name: cols[3].to_string(),
                language: cols[1].to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MockEngineFactory  (test-only)
// ---------------------------------------------------------------------------

/// Stage at which [`MockEngineFactory`] engines fail.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Never,
    Create,
    Voices,
    Write,
}

/// What the last mock engine was asked to do.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub engines_created: usize,
    pub rate: Option<u32>,
    pub voice: Option<Voice>,
    pub text: Option<String>,
}

/// A test double that writes the text it receives to the output path.
#[cfg(test)]
#[derive(Clone)]
pub struct MockEngineFactory {
    voices: Vec<Voice>,
    fail_at: FailAt,
    recorded: std::sync::Arc<std::sync::Mutex<Recorded>>,
}

#[cfg(test)]
impl MockEngineFactory {
    pub fn new(voices: Vec<Voice>, fail_at: FailAt) -> Self {
        Self {
            voices,
            fail_at,
            recorded: Default::default(),
        }
    }

    pub fn ok() -> Self {
        Self::new(vec![voice("en-us", "English_(America)")], FailAt::Never)
    }

    pub fn failing(fail_at: FailAt) -> Self {
        Self::new(vec![voice("en-us", "English_(America)")], fail_at)
    }

    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }
}

#[cfg(test)]
pub fn voice(language: &str, name: &str) -> Voice {
    Voice {
        id: language.into(),
        name: name.into(),
        language: language.into(),
    }
}

#[cfg(test)]
struct MockEngine {
    voices: Vec<Voice>,
    fail_at: FailAt,
    recorded: std::sync::Arc<std::sync::Mutex<Recorded>>,
}

#[cfg(test)]
impl SpeechEngineFactory for MockEngineFactory {
    fn create(&self) -> Result<Box<dyn SpeechEngine>, TtsError> {
        if self.fail_at == FailAt::Create {
            return Err(TtsError::EngineUnavailable("mock".into()));
        }
        self.recorded.lock().unwrap().engines_created += 1;
        Ok(Box::new(MockEngine {
            voices: self.voices.clone(),
            fail_at: self.fail_at,
            recorded: self.recorded.clone(),
        }))
    }
}

#[cfg(test)]
impl SpeechEngine for MockEngine {
    fn voices(&self) -> Result<Vec<Voice>, TtsError> {
        if self.fail_at == FailAt::Voices {
            return Err(TtsError::Voices("mock".into()));
        }
        Ok(self.voices.clone())
    }

    fn set_rate(&mut self, wpm: u32) {
        self.recorded.lock().unwrap().rate = Some(wpm);
    }

    fn set_voice(&mut self, voice: &Voice) {
        self.recorded.lock().unwrap().voice = Some(voice.clone());
    }

    fn save_to_file(&mut self, text: &str, path: &Path) -> Result<(), TtsError> {
        self.recorded.lock().unwrap().text = Some(text.to_string());
        if self.fail_at == FailAt::Write {
            return Err(TtsError::Synthesis("mock".into()));
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VOICES_OUTPUT: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 2  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)
 5  en-in           --/M      English_(India)    gmw/en-IN
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
garbage line
";

    #[test]
    fn parses_voice_table() {
        let voices = parse_voice_list(VOICES_OUTPUT);
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[0], voice("af", "Afrikaans"));
        assert_eq!(voices[2].id, "en-in");
        assert_eq!(voices[2].name, "English_(India)");
    }

    #[test]
    fn empty_output_has_no_voices() {
        assert!(parse_voice_list("").is_empty());
    }

    #[test]
    fn voice_matching_is_case_insensitive() {
        let v = voice("en-in", "English_(India)");
        assert!(v.matches("india"));
        assert!(v.matches("EN-IN"));
        assert!(!v.matches("en-gb"));
        assert!(!v.matches(""));
    }

    #[test]
    fn synth_args_include_rate_voice_and_output() {
        let mut engine = EspeakEngine {
            program: "espeak-ng".into(),
            rate: None,
            voice: None,
        };
        engine.set_rate(130);
        engine.set_voice(&voice("en-in", "English_(India)"));

        let args = engine.synth_args(Path::new("static/audio/output.wav"));
        assert_eq!(
            args,
            ["-s", "130", "-v", "en-in", "-w", "static/audio/output.wav", "--stdin"]
        );
    }

    #[test]
    fn synth_args_without_voice_use_engine_default() {
        let engine = EspeakEngine {
            program: "espeak-ng".into(),
            rate: Some(130),
            voice: None,
        };
        let args = engine.synth_args(Path::new("out.wav"));
        assert!(!args.contains(&"-v".to_string()));
    }

    /// `sh -s 130 -w <path> --stdin` runs stdin as a script: the first line
    /// floods stderr well past a pipe buffer before the rest is read.
    #[cfg(unix)]
    #[test]
    fn noisy_engine_does_not_stall_on_large_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = EspeakEngine {
            program: "sh".into(),
            rate: None,
            voice: None,
        };
        engine.set_rate(130);

        let mut script = String::from("yes noise | head -c 300000 >&2\n");
        for _ in 0..3000 {
            script.push('#');
            script.push_str(&"x".repeat(99));
            script.push('\n');
        }

        let result = engine.save_to_file(&script, &dir.path().join("out.wav"));
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn missing_program_is_unavailable() {
        let factory = EspeakFactory::new("definitely-not-a-speech-engine-binary");
        assert!(matches!(
            factory.create(),
            Err(TtsError::EngineUnavailable(_))
        ));
    }
}
