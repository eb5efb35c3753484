//! Markdown to sanitized HTML.
//!
//! pulldown-cmark does the parsing. The event stream is rewritten before it
//! reaches the stock HTML writer: constructs with custom markup (code blocks,
//! headings, links, images, callouts, lists) are collapsed into raw HTML
//! events built here, everything else passes through untouched. Raw HTML in
//! the *source* is never trusted; it is demoted to text and escaped.

use std::sync::LazyLock;

use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{
    BlockQuoteKind, CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd, html,
};
use regex::Regex;
use tracing::warn;
use url::Url;

use crate::app_settings::RenderSettings;
use crate::error::Result;
use crate::markdown::code_block::code_block_html;
use crate::markdown::preprocess::link_bare_urls;
use crate::markdown::sanitize::{is_external_url, sanitize_html};

static NON_WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_]+").expect("anchor pattern is valid"));

#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    settings: RenderSettings,
}

impl MarkdownRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
            | Options::ENABLE_MATH;
        if self.settings.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }

    /// Renders `markdown`, falling back to escaped plain text if any stage
    /// fails. Never panics on malformed input.
    pub fn render(&self, markdown: &str) -> String {
        match self.try_render(markdown) {
            Ok(html) => html,
            Err(err) => {
                warn!(error = %err, "markdown rendering failed, showing plain text");
                plain_text_html(markdown)
            }
        }
    }

    pub fn try_render(&self, markdown: &str) -> Result<String> {
        let source = link_bare_urls(markdown);
        let parser = Parser::new_ext(&source, self.options());
        let html = self.render_events(parser)?;
        sanitize_html(&html)
    }

    fn render_events<'a, I>(&self, events: I) -> Result<String>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let events = self.transform(events)?;
        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }

    /// Single pass over the event stream. Constructs whose opening markup
    /// depends on their content leave a placeholder at `at` that is filled
    /// in when their end event arrives, so nesting depth costs heap, not
    /// stack.
    fn transform<'a, I>(&self, mut events: I) -> Result<Vec<Event<'a>>>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let mut out: Vec<Event<'a>> = Vec::new();
        let mut inline: Vec<OpenInline> = Vec::new();
        let mut quotes: Vec<OpenQuote> = Vec::new();
        let mut quote_depth = 0usize;
        let mut items: Vec<usize> = Vec::new();

        while let Some(event) = events.next() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let info = match kind {
                        CodeBlockKind::Fenced(info) => info.into_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    let code = plain_text(&take_inner(&mut events));
                    if let Some(quote) = quotes.last_mut() {
                        quote.markers |= marker_bits(&code);
                    }
                    out.push(Event::Html(code_block_html(&info, &code, &self.settings.code_block)?.into()));
                }
                Event::Start(Tag::Heading { level, .. }) => {
                    inline.push(OpenInline {
                        at: out.len(),
                        text: String::new(),
                        kind: InlineKind::Heading(level),
                    });
                    out.push(placeholder());
                }
                Event::End(TagEnd::Heading(_)) => {
                    let Some(open) = pop_inline(&mut inline) else { continue };
                    if let InlineKind::Heading(level) = open.kind {
                        let n = level as usize;
                        out[open.at] = Event::Html(heading_open(level, &open.text).into());
                        out.push(Event::Html(format!("</h{n}>\n").into()));
                    }
                }
                Event::Start(Tag::BlockQuote(kind)) => {
                    quote_depth += 1;
                    if quote_depth > MAX_CALLOUT_DEPTH {
                        out.push(Event::Start(Tag::BlockQuote(kind)));
                    } else {
                        quotes.push(OpenQuote {
                            at: out.len(),
                            kind,
                            markers: 0,
                        });
                        out.push(placeholder());
                    }
                }
                Event::End(TagEnd::BlockQuote(kind)) => {
                    quote_depth = quote_depth.saturating_sub(1);
                    if quote_depth >= MAX_CALLOUT_DEPTH {
                        out.push(Event::End(TagEnd::BlockQuote(kind)));
                        continue;
                    }
                    let Some(open) = quotes.pop() else { continue };
                    if let Some(parent) = quotes.last_mut() {
                        parent.markers |= open.markers;
                    }
                    let callout = callout_for(open.kind, open.markers);
                    if !callout.markers.is_empty() {
                        strip_markers(&mut out[open.at + 1..], callout.markers);
                    }
                    out[open.at] = Event::Html(callout_open(&callout).into());
                    out.push(Event::Html("</div></div>\n".into()));
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    ..
                }) => {
                    inline.push(OpenInline {
                        at: out.len(),
                        text: String::new(),
                        kind: InlineKind::Link {
                            link_type,
                            dest: dest_url.into_string(),
                            title: title.into_string(),
                        },
                    });
                    out.push(placeholder());
                }
                Event::End(TagEnd::Link) => {
                    let Some(open) = pop_inline(&mut inline) else { continue };
                    if let InlineKind::Link { link_type, dest, title } = open.kind {
                        let (open_tag, label) = self.link_open(link_type, &dest, &title, &open.text);
                        match label {
                            Some(label) => {
                                out.truncate(open.at + 1);
                                out[open.at] = Event::InlineHtml(format!("{open_tag}{label}</a>").into());
                            }
                            None => {
                                out[open.at] = Event::InlineHtml(open_tag.into());
                                out.push(Event::InlineHtml("</a>".into()));
                            }
                        }
                    }
                }
                Event::Start(Tag::Image { dest_url, title, .. }) => {
                    let alt = plain_text(&take_inner(&mut events));
                    record_text(&mut inline, &mut quotes, &alt);
                    out.push(Event::InlineHtml(image_html(&dest_url, &title, &alt).into()));
                }
                Event::Start(Tag::Table(alignments)) => {
                    out.push(Event::Html("<div class=\"table-container\">".into()));
                    out.push(Event::Start(Tag::Table(alignments)));
                }
                Event::End(TagEnd::Table) => {
                    out.push(Event::End(TagEnd::Table));
                    out.push(Event::Html("</div>\n".into()));
                }
                Event::Start(Tag::List(Some(start))) => {
                    let start_attr = if start == 1 { String::new() } else { format!(" start=\"{start}\"") };
                    out.push(Event::Html(format!("<ol class=\"ordered-list\"{start_attr}>\n").into()));
                }
                Event::Start(Tag::List(None)) => out.push(Event::Html("<ul class=\"unordered-list\">\n".into())),
                Event::End(TagEnd::List(true)) => out.push(Event::Html("</ol>\n".into())),
                Event::End(TagEnd::List(false)) => out.push(Event::Html("</ul>\n".into())),
                Event::Start(Tag::Item) => {
                    items.push(out.len());
                    out.push(Event::Html("<li class=\"custom-list-item\">".into()));
                }
                Event::End(TagEnd::Item) => {
                    items.pop();
                    out.push(Event::Html("</li>\n".into()));
                }
                // Tight lists put the marker right after the item start, loose
                // lists inside its first paragraph.
                Event::TaskListMarker(checked) => {
                    let Some(&at) = items.last() else { continue };
                    let (class, checkbox) = if checked {
                        (
                            "<li class=\"custom-list-item task-list-item checked\">",
                            "<input type=\"checkbox\" disabled=\"\" checked=\"\"/> ",
                        )
                    } else {
                        (
                            "<li class=\"custom-list-item task-list-item\">",
                            "<input type=\"checkbox\" disabled=\"\"/> ",
                        )
                    };
                    out[at] = Event::Html(class.into());
                    out.push(Event::InlineHtml(checkbox.into()));
                }
                Event::Text(text) => {
                    record_text(&mut inline, &mut quotes, &text);
                    out.push(Event::Text(text));
                }
                Event::Code(code) => {
                    record_text(&mut inline, &mut quotes, &code);
                    out.push(Event::Code(code));
                }
                Event::InlineMath(math) => {
                    record_text(&mut inline, &mut quotes, &math);
                    out.push(Event::InlineHtml(
                        format!("<span class=\"math-inline\">{}</span>", encode_text(&math)).into(),
                    ));
                }
                Event::DisplayMath(math) => {
                    record_text(&mut inline, &mut quotes, &math);
                    out.push(Event::InlineHtml(
                        format!("<div class=\"math-block\">{}</div>", encode_text(&math)).into(),
                    ));
                }
                Event::Start(Tag::HtmlBlock) => out.push(Event::Start(Tag::Paragraph)),
                Event::End(TagEnd::HtmlBlock) => out.push(Event::End(TagEnd::Paragraph)),
                Event::Html(raw) | Event::InlineHtml(raw) => {
                    if let Some(quote) = quotes.last_mut() {
                        quote.markers |= marker_bits(&raw);
                    }
                    out.push(Event::Text(raw));
                }
                Event::SoftBreak => {
                    record_text(&mut inline, &mut quotes, " ");
                    out.push(if self.settings.hard_breaks { Event::HardBreak } else { Event::SoftBreak });
                }
                Event::HardBreak => {
                    record_text(&mut inline, &mut quotes, " ");
                    out.push(Event::HardBreak);
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    /// Opening `<a ...>` tag plus, for bare external URLs, a shortened label
    /// that replaces the link's own content.
    fn link_open(&self, link_type: LinkType, dest: &str, title: &str, text: &str) -> (String, Option<String>) {
        let href = if link_type == LinkType::Email && !dest.starts_with("mailto:") {
            format!("mailto:{dest}")
        } else {
            dest.to_string()
        };
        let external = is_external_url(&href);
        let auto = link_type == LinkType::Autolink || text == dest;

        let label = if auto && external {
            shorten_url_label(&href, self.settings.link_path_max_chars).map(|label| encode_text(&label).into_owned())
        } else {
            None
        };

        let mut html = format!("<a href=\"{}\"", encode_double_quoted_attribute(&href));
        if !title.is_empty() {
            html.push_str(&format!(" title=\"{}\"", encode_double_quoted_attribute(title)));
        }
        html.push_str(if external { " class=\"external-link" } else { " class=\"internal-link" });
        if !auto {
            html.push_str(" markdown-link");
        }
        html.push('"');
        if external {
            html.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
        }
        if !auto {
            html.push_str(" data-markdown-formatted=\"true\"");
        }
        html.push('>');
        (html, label)
    }
}

/// Callout styling stops here; deeper quotes render as plain `<blockquote>`.
const MAX_CALLOUT_DEPTH: usize = 32;

enum InlineKind {
    Heading(HeadingLevel),
    Link {
        link_type: LinkType,
        dest: String,
        title: String,
    },
}

struct OpenInline {
    at: usize,
    text: String,
    kind: InlineKind,
}

struct OpenQuote {
    at: usize,
    kind: Option<BlockQuoteKind>,
    markers: u8,
}

fn placeholder<'a>() -> Event<'a> {
    Event::Html("".into())
}

/// Pops the innermost heading or link, folding its text into the parent.
fn pop_inline(inline: &mut Vec<OpenInline>) -> Option<OpenInline> {
    let open = inline.pop()?;
    if let Some(parent) = inline.last_mut() {
        parent.text.push_str(&open.text);
    }
    Some(open)
}

fn record_text(inline: &mut [OpenInline], quotes: &mut [OpenQuote], text: &str) {
    if let Some(open) = inline.last_mut() {
        open.text.push_str(text);
    }
    if let Some(quote) = quotes.last_mut() {
        quote.markers |= marker_bits(text);
    }
}

/// Pulls every event up to the end of the construct just opened, leaving
/// the iterator positioned after its closing event.
fn take_inner<'a, I>(events: &mut I) -> Vec<Event<'a>>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut depth = 0usize;
    let mut inner = Vec::new();
    for event in events.by_ref() {
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            _ => {}
        }
        inner.push(event);
    }
    inner
}

fn plain_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) | Event::InlineMath(t) | Event::DisplayMath(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Lowercased heading text with every run of characters outside ASCII
/// `[0-9A-Za-z_]` collapsed to one hyphen.
pub fn anchor_name(text: &str) -> String {
    NON_WORD_RUN.replace_all(&text.to_lowercase(), "-").into_owned()
}

fn heading_open(level: HeadingLevel, text: &str) -> String {
    let n = level as usize;
    let anchor = anchor_name(text);
    let anchor = encode_double_quoted_attribute(&anchor);
    format!(
        "<h{n} class=\"custom-heading heading-{n}\"><a name=\"{anchor}\" class=\"anchor\" href=\"#{anchor}\"><span class=\"header-link\">#</span></a>"
    )
}

struct Callout {
    bit: u8,
    class: &'static str,
    icon: &'static str,
    title: &'static str,
    markers: &'static [&'static str],
}

const WARNING_ICON: &str = "\u{26a0}\u{fe0f}";
const TIP_ICON: &str = "\u{1f4a1}";
const INFO_ICON: &str = "\u{2139}\u{fe0f}";

const WARNING: Callout = Callout {
    bit: 1,
    class: "warning",
    icon: WARNING_ICON,
    title: "Warning",
    markers: &["WARNING:", WARNING_ICON],
};
const TIP: Callout = Callout {
    bit: 2,
    class: "tip",
    icon: TIP_ICON,
    title: "Tip",
    markers: &["TIP:", TIP_ICON],
};
const INFO: Callout = Callout {
    bit: 4,
    class: "info",
    icon: INFO_ICON,
    title: "Info",
    markers: &["INFO:", INFO_ICON],
};
const NOTE: Callout = Callout {
    bit: 0,
    class: "info",
    icon: TIP_ICON,
    title: "Note",
    markers: &[],
};

fn callout_for(kind: Option<BlockQuoteKind>, markers: u8) -> Callout {
    match kind {
        Some(BlockQuoteKind::Warning) => return WARNING,
        Some(BlockQuoteKind::Caution) => return Callout { title: "Caution", ..WARNING },
        Some(BlockQuoteKind::Tip) => return TIP,
        Some(BlockQuoteKind::Important) => return Callout { title: "Important", ..INFO },
        Some(BlockQuoteKind::Note) => return Callout { title: "Note", ..INFO },
        None => {}
    }
    [WARNING, TIP, INFO]
        .into_iter()
        .find(|callout| markers & callout.bit != 0)
        .unwrap_or(NOTE)
}

/// Which callout markers occur in `text`, one bit per callout.
fn marker_bits(text: &str) -> u8 {
    [WARNING, TIP, INFO]
        .iter()
        .filter(|callout| callout.markers.iter().any(|marker| text.contains(marker)))
        .fold(0, |bits, callout| bits | callout.bit)
}

fn strip_markers(events: &mut [Event<'_>], markers: &[&str]) {
    for event in events {
        if let Event::Text(text) | Event::Code(text) = event {
            if markers.iter().any(|marker| text.contains(marker)) {
                let mut stripped = text.to_string();
                for marker in markers {
                    stripped = stripped.replace(marker, "");
                }
                *text = stripped.into();
            }
        }
    }
}

fn callout_open(callout: &Callout) -> String {
    format!(
        concat!(
            "<div class=\"custom-blockquote {class}\">",
            "<div class=\"blockquote-header\">",
            "<span class=\"blockquote-icon\">{icon}</span>",
            "<span class=\"blockquote-title\">{title}</span>",
            "</div>",
            "<div class=\"blockquote-content\">"
        ),
        class = callout.class,
        icon = callout.icon,
        title = callout.title,
    )
}

/// `https://www.example.com/some/long/path?q=1` → `example.com/some/long/pat...`
pub fn shorten_url_label(href: &str, path_max_chars: usize) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let host = url.host_str()?;
    let mut label = host.strip_prefix("www.").unwrap_or(host).to_string();
    let path = url.path();
    if !path.is_empty() && path != "/" {
        if path.chars().count() > path_max_chars {
            label.extend(path.chars().take(path_max_chars));
            label.push_str("...");
        } else {
            label.push_str(path);
        }
    }
    Some(label)
}

fn image_html(src: &str, title: &str, alt: &str) -> String {
    let tooltip = if title.is_empty() { alt } else { title };
    let caption = if title.is_empty() {
        String::new()
    } else {
        format!("<div class=\"image-caption\">{}</div>", encode_text(title))
    };
    format!(
        "<div class=\"image-container\"><img src=\"{}\" alt=\"{}\" title=\"{}\" class=\"markdown-image\" loading=\"lazy\"/>{}</div>",
        encode_double_quoted_attribute(src),
        encode_double_quoted_attribute(alt),
        encode_double_quoted_attribute(tooltip),
        caption,
    )
}

/// Escaped text with line breaks kept, the last-resort rendering.
pub fn plain_text_html(text: &str) -> String {
    let escaped = encode_text(text);
    format!("<p class=\"plain-text\">{}</p>", escaped.replace('\n', "<br/>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(md: &str) -> String {
        MarkdownRenderer::default().render(md)
    }

    #[test]
    fn headings_get_anchors() {
        let html = render("# Hello World");
        assert!(html.contains("<h1 class=\"custom-heading heading-1\">"));
        assert!(html.contains("<a name=\"hello-world\" class=\"anchor\" href=\"#hello-world\">"));
        assert!(html.contains("Hello World</h1>"));
    }

    #[test]
    fn anchor_collapses_non_word_runs() {
        assert_eq!(anchor_name("What's New?  (v2)"), "what-s-new-v2-");
        assert_eq!(anchor_name("Title"), "title");
        assert_eq!(anchor_name("Café Ünïcode"), "caf-n-code");
    }

    #[test]
    fn heading_anchor_includes_link_and_code_text() {
        let html = render("## Using `cargo` with [docs](https://docs.rs)");
        assert!(html.contains("name=\"using-cargo-with-docs\""), "{html}");
        assert!(html.contains("<code>cargo</code>"));
        assert!(html.contains("</a></h2>"));
    }

    #[test]
    fn bold_and_paragraphs_render() {
        let html = render("Hello **world**");
        assert!(html.contains("<strong>world</strong>"));
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn external_links_open_in_new_tab() {
        let html = render("[click](https://example.com)");
        assert!(html.contains("href=\"https://example.com\""));
        assert!(html.contains("target=\"_blank\""));
        assert!(html.contains("rel=\"noopener noreferrer\""));
        assert!(html.contains("data-markdown-formatted=\"true\""));
        assert!(html.contains("markdown-link"));
        assert!(html.contains(">click</a>"));
    }

    #[test]
    fn local_links_have_no_target() {
        let html = render("[home](/local)");
        assert!(html.contains("href=\"/local\""));
        assert!(html.contains("internal-link"));
        assert!(!html.contains("target="));
    }

    #[test]
    fn bare_urls_get_short_labels() {
        let html = render("see https://www.example.com/a/very/long/path/here ok");
        assert!(html.contains("href=\"https://www.example.com/a/very/long/path/here\""));
        assert!(html.contains(">example.com/a/very/long/pa...</a>"));
        assert!(!html.contains("data-markdown-formatted"));
    }

    #[test]
    fn url_label_shortening() {
        assert_eq!(shorten_url_label("https://www.rust-lang.org/", 15).as_deref(), Some("rust-lang.org"));
        assert_eq!(shorten_url_label("https://docs.rs/regex", 15).as_deref(), Some("docs.rs/regex"));
        assert_eq!(shorten_url_label("not a url", 15), None);
    }

    #[test]
    fn email_autolinks_get_mailto() {
        let html = render("<someone@example.com>");
        assert!(html.contains("href=\"mailto:someone@example.com\""));
    }

    #[test]
    fn javascript_links_lose_their_href() {
        let html = render("[x](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn raw_html_is_escaped_text() {
        let html = render("X </think> Y");
        assert!(html.contains("&lt;/think&gt;"));
        let html = render("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn callouts_from_markers() {
        let html = render("> WARNING: hot surface");
        assert!(html.contains("<div class=\"custom-blockquote warning\">"));
        assert!(html.contains("<span class=\"blockquote-title\">Warning</span>"));
        assert!(!html.contains("WARNING:"));
        assert!(html.contains("hot surface"));

        let html = render("> TIP: use cargo");
        assert!(html.contains("custom-blockquote tip"));

        let html = render("> just a quote");
        assert!(html.contains("custom-blockquote info"));
        assert!(html.contains(">Note</span>"));
    }

    #[test]
    fn nested_callouts_share_inner_markers() {
        let html = render("> outer\n>\n> > TIP: inner");
        assert_eq!(html.matches("<div class=\"custom-blockquote").count(), 2);
        // The outer quote contains the marker too, so it takes the same style.
        assert_eq!(html.matches("custom-blockquote tip").count(), 2);
        assert!(!html.contains("TIP:"));
        assert!(html.contains("inner"));
    }

    #[test]
    fn deep_quotes_render_without_recursion() {
        let depth = 5000;
        let html = render(&format!("{} deep", ">".repeat(depth)));
        assert_eq!(html.matches("custom-blockquote").count(), MAX_CALLOUT_DEPTH);
        assert!(html.contains("<blockquote>"));
        assert!(html.contains("deep"));
        assert!(!html.contains("plain-text"));
    }

    #[test]
    fn callouts_from_gfm_alerts() {
        let html = render("> [!CAUTION]\n> careful");
        assert!(html.contains("custom-blockquote warning"));
        assert!(html.contains(">Caution</span>"));
    }

    #[test]
    fn tables_are_wrapped() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<div class=\"table-container\"><table>"));
        assert!(html.contains("</table>\n</div>") || html.contains("</table></div>"));
    }

    #[test]
    fn images_get_containers_and_captions() {
        let html = render("![a cat](https://example.com/cat.png \"My cat\")");
        assert!(html.contains("<div class=\"image-container\">"));
        assert!(html.contains("src=\"https://example.com/cat.png\""));
        assert!(html.contains("alt=\"a cat\""));
        assert!(html.contains("<div class=\"image-caption\">My cat</div>"));

        let html = render("![a cat](https://example.com/cat.png)");
        assert!(!html.contains("image-caption"));
        assert!(html.contains("title=\"a cat\""));
    }

    #[test]
    fn lists_get_classes() {
        let html = render("- one\n- two");
        assert!(html.contains("<ul class=\"unordered-list\">"));
        assert!(html.contains("<li class=\"custom-list-item\">one</li>"));

        let html = render("3. three\n4. four");
        assert!(html.contains("<ol class=\"ordered-list\" start=\"3\">"));

        let html = render("- [x] done\n- [ ] todo");
        assert!(html.contains("task-list-item checked"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn loose_task_lists_keep_their_classes() {
        let html = render("- [x] a\n\n- [ ] b");
        assert!(html.contains("<li class=\"custom-list-item task-list-item checked\">"), "{html}");
        assert!(html.contains("<li class=\"custom-list-item task-list-item\">"), "{html}");
        assert_eq!(html.matches("type=\"checkbox\"").count(), 2);
    }

    #[test]
    fn code_blocks_are_highlighted_with_copy_button() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains("<div class=\"code-block small\">"));
        assert!(html.contains("class=\"copy-code-button\""));
        assert!(html.contains("data-code=\"fn%20main()%20%7B%7D\""));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn math_and_diagrams_pass_through() {
        let html = render("Euler: $e^{i\\pi}+1=0$");
        assert!(html.contains("<span class=\"math-inline\">"));
        let html = render("```mermaid\ngraph TD; A-->B\n```");
        assert!(html.contains("<div class=\"mermaid-diagram\">"));
    }

    #[test]
    fn single_newlines_become_breaks() {
        let html = render("line one\nline two");
        assert!(html.contains("<br />") || html.contains("<br/>") || html.contains("<br>"));
    }

    #[test]
    fn plain_text_fallback_escapes() {
        assert_eq!(plain_text_html("a <b>\nc"), "<p class=\"plain-text\">a &lt;b&gt;<br/>c</p>");
    }

    #[test]
    fn plain_text_collects_inline_content() {
        let events = vec![Event::Text("a".into()), Event::Code("b".into()), Event::SoftBreak, Event::Text("c".into())];
        assert_eq!(plain_text(&events), "ab c");
    }
}
