//! Values flowing into and out of the request pipeline.

use std::fmt;

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// A trimmed, non-empty topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    /// Trim `raw`; `None` when nothing is left.
    ///
    /// ```
    /// use topic_explainer::pipeline::Topic;
    ///
    /// assert_eq!(Topic::parse("  tides \n").unwrap().as_str(), "tides");
    /// assert!(Topic::parse(" \t ").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RenderedResponse
// ---------------------------------------------------------------------------

/// HTML fragment ready to embed in a page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResponse {
    html: String,
    is_error: bool,
}

impl RenderedResponse {
    pub fn content(html: String) -> Self {
        Self {
            html,
            is_error: false,
        }
    }

    pub fn error(html: String) -> Self {
        Self {
            html,
            is_error: true,
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// `true` when this fragment reports a generation failure.
    pub fn is_error(&self) -> bool {
        self.is_error
    }
}

// ---------------------------------------------------------------------------
// PipelineOutcome
// ---------------------------------------------------------------------------

/// Everything the presentation layer needs for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// `None` when no topic was supplied.
    pub rendered: Option<RenderedResponse>,
    /// Public URL path of the synthesized audio, when there is one.
    pub audio_path: Option<String>,
}

impl PipelineOutcome {
    /// The no-op outcome for empty input.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_none() && self.audio_path.is_none()
    }
}
