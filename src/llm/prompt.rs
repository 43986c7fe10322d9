//! Prompt builder for topic explanations.
//!
//! [`PromptBuilder`] turns a user-supplied topic into the single instruction
//! sent to the generation service.  The topic is embedded verbatim; the
//! service receives raw text, so no escaping is applied.

/// Instruction wrapped around the topic.  `{topic}` is replaced verbatim.
const EXPLAIN_TEMPLATE: &str = "\
Explain the topic '{topic}' in a simple, fun, clear way for learners of all ages. \
Use real-life examples, highlight the key points in **bold**, \
and organise the answer with short subheadings and bullet points.";

/// Builds the explanation prompt for a topic.
///
/// # Example
/// ```rust
/// use topic_explainer::llm::PromptBuilder;
///
/// let prompt = PromptBuilder::new().build("photosynthesis");
/// assert!(prompt.contains("'photosynthesis'"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: &'static str,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            template: EXPLAIN_TEMPLATE,
        }
    }

    /// Build the prompt for `topic`.  Pure and deterministic.
    pub fn build(&self, topic: &str) -> String {
        self.template.replacen("{topic}", topic, 1)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
