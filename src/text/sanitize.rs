//! Speech-friendly text cleanup.
//!
//! The synthesizer would otherwise read formatting symbols aloud.  This is a
//! character-class strip, not a markdown parser: every `*`, `#`, `-` and `•`
//! is removed wherever it occurs (hyphens inside words included), and nothing
//! else is touched.

/// Characters removed by [`sanitize_for_speech`].
pub const DECORATION_CHARS: [char; 4] = ['*', '#', '-', '•'];

/// Remove markdown decoration characters from `markdown`.
///
/// Idempotent: `sanitize_for_speech(&sanitize_for_speech(x)) == sanitize_for_speech(x)`.
///
/// ```
/// use topic_explainer::text::sanitize_for_speech;
///
/// assert_eq!(
///     sanitize_for_speech("**Gravity** pulls things down."),
///     "Gravity pulls things down."
/// );
/// ```
pub fn sanitize_for_speech(markdown: &str) -> String {
    markdown.replace(DECORATION_CHARS, "")
}
