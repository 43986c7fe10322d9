//! The single HTML page: topic form, response fragment and audio player.

use crate::pipeline::PipelineOutcome;
use crate::text::escape_html;

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 2rem auto; }
body { padding: 0 1rem; line-height: 1.5; }
form { display: flex; gap: .5rem; }
input[name=topic] { flex: 1; padding: .5rem; font-size: 1rem; }
button { padding: .5rem 1rem; font-size: 1rem; }
.response { margin-top: 1.5rem; }
.response pre { background: #f4f4f4; padding: .75rem; overflow-x: auto; }
.response table { border-collapse: collapse; }
.response th, .response td { border: 1px solid #ccc; padding: .25rem .5rem; }
audio { margin-top: 1rem; width: 100%; }";

/// Render the full page.  `topic` is echoed back into the input field.
pub fn render_page(topic: &str, outcome: &PipelineOutcome) -> String {
    let mut body = String::new();

    if let Some(rendered) = &outcome.rendered {
        body.push_str("<section class=\"response\">\n");
        body.push_str(rendered.html());
        body.push_str("\n</section>\n");
    }

    if let Some(path) = &outcome.audio_path {
        body.push_str(&format!(
            "<audio controls src=\"{}\"></audio>\n",
            escape_html(path)
        ));
    }

    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
<title>Topic Explainer</title>
<style>
{STYLE}
</style>
</head>
<body>
<h1>Topic Explainer</h1>
<form method=\"post\" action=\"/\">
<input type=\"text\" name=\"topic\" placeholder=\"Enter a topic\" value=\"{topic}\" autofocus>
<button type=\"submit\">Explain</button>
</form>
{body}</body>
</html>
",
        topic = escape_html(topic),
    )
}
