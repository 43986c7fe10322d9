//! HTML rendering of generated text.
//!
//! [`render_markdown`] converts markdown (with tables, strikethrough and
//! fenced code) to an HTML fragment using `pulldown-cmark`.  Raw HTML in the
//! input is escaped rather than passed through, and link or image targets
//! with a scheme other than `http`, `https` or `mailto` are replaced by `#`,
//! so the output is safe to embed directly in a page body.  Underscores
//! inside words are never emphasis (CommonMark flanking rules), so
//! `snake_case` survives intact.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Markdown extensions enabled on top of CommonMark.
fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts
}

/// Render `markdown` to an embeddable HTML fragment.
///
/// ```
/// use topic_explainer::text::render_markdown;
///
/// let html = render_markdown("**Gravity** pulls things down.");
/// assert!(html.contains("<strong>Gravity</strong>"));
/// ```
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Keep relative targets and `http`/`https`/`mailto` URLs; anything else
/// (`javascript:`, `data:`, `vbscript:` ...) becomes `#`.
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    // Browsers ignore whitespace and control characters inside a scheme.
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();

    let scheme_end = cleaned.find([':', '/', '?', '#']);
    let allowed = match scheme_end {
        Some(i) if cleaned[i..].starts_with(':') => {
            let scheme = cleaned[..i].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    };

    if allowed {
        url
    } else {
        log::debug!("markup: dropping unsafe link target {:?}", &*url);
        CowStr::Borrowed("#")
    }
}

/// Render `text` verbatim: HTML-escaped, whitespace and line breaks kept.
pub fn render_plain(text: &str) -> String {
    format!(
        "<div style=\"white-space: pre-wrap;\">{}</div>",
        escape_html(text)
    )
}

/// Error-styled fragment shown when generation fails.
pub fn render_error(message: &str) -> String {
    format!(
        "<p style=\"color: red;\">\u{26a0}\u{fe0f} {}</p>",
        escape_html(message)
    )
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
