//! Allow-list HTML sanitizer built on a streaming lol_html rewrite.
//!
//! Everything the renderer emits passes through here before it can reach a
//! document. Unknown container tags are unwrapped (content kept), dangerous
//! ones are dropped with their content, comments are dropped and every
//! attribute not on the allow-list for its tag disappears silently.
//!
//! Anchors get a final hook after attribute filtering: external links always
//! leave with `target="_blank" rel="noopener noreferrer"` and internal links
//! never carry a `target`. Without the hook a naive allow-list either drops
//! the attributes that make links work or lets arbitrary targets through.

use html_escape::decode_html_entities;
use lol_html::{HtmlRewriter, Settings, comments, element};

use crate::error::Result;

/// Tags removed together with everything inside them.
const DROPPED_TAGS: &[&str] = &["script", "style", "iframe", "object", "embed", "template", "noscript", "title"];

const ALLOWED_TAGS: &[&str] = &[
    "a", "blockquote", "br", "button", "code", "del", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "img",
    "input", "li", "ol", "p", "path", "pre", "rect", "s", "section", "span", "strong", "sub", "sup", "svg", "table",
    "tbody", "td", "th", "thead", "tr", "ul",
];

/// Attributes allowed on any allowed tag.
const GLOBAL_ATTRIBUTES: &[&str] = &["class", "id", "title", "aria-hidden", "aria-label", "aria-expanded"];

fn tag_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "name", "target", "rel", "data-markdown-formatted"],
        "img" => &["src", "alt", "loading", "width", "height"],
        "button" => &["type", "data-code", "data-block-id"],
        "div" => &["data-block-id"],
        "ol" => &["start"],
        "input" => &["type", "checked", "disabled"],
        "th" | "td" => &["style", "colspan", "rowspan"],
        "svg" => &[
            "xmlns", "viewbox", "width", "height", "fill", "stroke", "stroke-width", "stroke-linecap", "stroke-linejoin",
        ],
        "rect" => &["x", "y", "width", "height", "rx", "ry"],
        "path" => &["d"],
        _ => &[],
    }
}

const URL_ATTRIBUTES: &[&str] = &["href", "src"];
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// True for relative references, fragments and allow-listed schemes.
pub fn is_safe_url(value: &str) -> bool {
    // Browsers ignore embedded whitespace and control characters when
    // resolving a scheme, so `java\tscript:` must be caught too.
    let compact: String = value.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
    match compact.find(':') {
        None => true,
        Some(colon) => {
            let scheme = &compact[..colon];
            if scheme.contains(['/', '?', '#']) {
                return true;
            }
            ALLOWED_SCHEMES.iter().any(|allowed| scheme.eq_ignore_ascii_case(allowed))
        }
    }
}

pub fn is_external_url(href: &str) -> bool {
    let href = href.trim_start();
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Sanitizes an HTML fragment against the allow-list.
pub fn sanitize_html(html: &str) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("*", |el| {
                    let tag = el.tag_name().to_ascii_lowercase();
                    if DROPPED_TAGS.contains(&tag.as_str()) {
                        el.remove();
                        return Ok(());
                    }
                    if !ALLOWED_TAGS.contains(&tag.as_str()) {
                        el.remove_and_keep_content();
                        return Ok(());
                    }

                    let allowed = tag_attributes(&tag);
                    let attributes: Vec<(String, String)> =
                        el.attributes().iter().map(|attr| (attr.name(), attr.value())).collect();
                    for (name, value) in &attributes {
                        let name_lower = name.to_ascii_lowercase();
                        let keep = (GLOBAL_ATTRIBUTES.contains(&name_lower.as_str())
                            || allowed.contains(&name_lower.as_str()))
                            && (!URL_ATTRIBUTES.contains(&name_lower.as_str())
                                || is_safe_url(&decode_html_entities(value)));
                        if !keep {
                            el.remove_attribute(name);
                        }
                    }

                    if tag == "a" {
                        match el.get_attribute("href") {
                            Some(href) if is_external_url(&decode_html_entities(&href)) => {
                                el.set_attribute("target", "_blank")?;
                                el.set_attribute("rel", "noopener noreferrer")?;
                            }
                            _ => {
                                el.remove_attribute("target");
                            }
                        }
                    }
                    Ok(())
                }),
                comments!("*", |comment| {
                    comment.remove();
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter.write(html.as_bytes())?;
    rewriter.end()?;
    Ok(String::from_utf8(output)?)
}
