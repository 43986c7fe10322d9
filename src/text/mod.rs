//! Text post-processing: HTML rendering for display and decoration
//! stripping for speech.

pub mod markup;
pub mod sanitize;

pub use markup::{escape_html, render_error, render_markdown, render_plain};
pub use sanitize::{sanitize_for_speech, DECORATION_CHARS};
