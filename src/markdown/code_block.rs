//! Code block markup: header with language label and copy button, then the
//! highlighted body.

use std::borrow::Cow;

use html_escape::{encode_double_quoted_attribute, encode_text};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::app_settings::CodeBlockSettings;
use crate::error::Result;
use crate::markdown::highlight::{self, Language};

/// The characters `encodeURIComponent` leaves alone, so the browser side can
/// decode the payload with the stock function.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const COPY_ICON: &str = concat!(
    r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">"#,
    r#"<rect x="9" y="9" width="13" height="13" rx="2" ry="2"></rect>"#,
    r#"<path d="M5 15H4a2 2 0 0 1-2-2V4a2 2 0 0 1 2-2h9a2 2 0 0 1 2 2v1"></path>"#,
    "</svg>"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub fn for_code(code: &str, settings: &CodeBlockSettings) -> Self {
        let lines = code.lines().count();
        if lines > settings.large_lines {
            SizeClass::Large
        } else if lines > settings.medium_lines {
            SizeClass::Medium
        } else {
            SizeClass::Small
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }
}

pub fn encode_copy_payload(code: &str) -> String {
    utf8_percent_encode(code, URI_COMPONENT).to_string()
}

pub fn decode_copy_payload(payload: &str) -> Option<String> {
    percent_decode_str(payload).decode_utf8().ok().map(Cow::into_owned)
}

/// Full markup for one fenced or indented block.
pub fn code_block_html(info: &str, code: &str, settings: &CodeBlockSettings) -> Result<String> {
    let code = code.strip_suffix('\n').unwrap_or(code);
    let requested = info.split_whitespace().next().unwrap_or("");
    if requested.eq_ignore_ascii_case("mermaid") {
        return Ok(format!("<div class=\"mermaid-diagram\">{}</div>\n", encode_text(code)));
    }

    let language = highlight::resolve_language(info, code);
    let highlighted = highlight::highlight(code, &language)?;
    Ok(render_block(code, &language, &highlighted, SizeClass::for_code(code, settings)))
}

fn render_block(code: &str, language: &Language, highlighted: &str, size: SizeClass) -> String {
    format!(
        concat!(
            "<div class=\"code-block {size}\">",
            "<div class=\"code-header\">",
            "<span class=\"code-language\">{label}</span>",
            "<button class=\"copy-code-button\" type=\"button\" aria-label=\"Copy code\" data-code=\"{payload}\">",
            "{icon}<span class=\"copy-success\">Copied!</span>",
            "</button>",
            "</div>",
            "<pre class=\"hljs\"><code class=\"language-{token}\">{body}</code></pre>",
            "</div>\n"
        ),
        size = size.as_str(),
        label = encode_text(&language.display_name),
        payload = encode_double_quoted_attribute(&encode_copy_payload(code)),
        icon = COPY_ICON,
        token = encode_double_quoted_attribute(&language.token),
        body = highlighted,
    )
}

/// A fenced block pulled out of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSnippet {
    pub language: String,
    pub code: String,
}

/// Lists the code blocks in `markdown` in document order. Blocks without an
/// info string report `plaintext`.
pub fn extract_code_blocks(markdown: &str) -> Vec<CodeSnippet> {
    let mut snippets = Vec::new();
    let mut current: Option<CodeSnippet> = None;

    for event in Parser::new_ext(markdown, Options::empty()) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or("").to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                current = Some(CodeSnippet {
                    language: if language.is_empty() { highlight::PLAIN_TEXT.to_string() } else { language },
                    code: String::new(),
                });
            }
            Event::Text(text) => {
                if let Some(snippet) = current.as_mut() {
                    snippet.code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(mut snippet) = current.take() {
                    snippet.code = snippet.code.trim().to_string();
                    snippets.push(snippet);
                }
            }
            _ => {}
        }
    }
    snippets
}
