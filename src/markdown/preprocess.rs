//! Source pre-pass run before markdown parsing.
//!
//! Promotes bare `http(s)://` URLs to `[url](url)` so they render through the
//! link rules. Fenced code (including an unterminated trailing fence while a
//! reply is still streaming), inline code spans and existing markdown links
//! are swapped for placeholders first so they are never double-linked or
//! corrupted.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static FENCED_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:```.*?(?:```|\z))|(?:~~~.*?(?:~~~|\z))").expect("fence pattern is valid")
});

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`\n]+`").expect("inline code pattern is valid"));

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[[^\]]+\]\([^)]+\)").expect("markdown link pattern is valid")
});

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(^|\s)(https?://[^\s<>\[\]]+)").expect("bare url pattern is valid")
});

// Private-use code points never produced by a model in practice.
const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\u{E000}(\\d+)\u{E001}").expect("placeholder pattern is valid")
});

/// Trailing characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

#[derive(Default)]
struct Stash {
    saved: Vec<String>,
}

impl Stash {
    fn protect<'t>(&mut self, pattern: &Regex, text: &'t str) -> Cow<'t, str> {
        pattern.replace_all(text, |caps: &Captures| {
            let index = self.saved.len();
            self.saved.push(caps[0].to_string());
            format!("{PLACEHOLDER_OPEN}{index}{PLACEHOLDER_CLOSE}")
        })
    }

    fn restore(&self, mut text: String) -> String {
        // A later stash can enclose an earlier placeholder, so unwind until
        // nothing is left.
        for _ in 0..=self.saved.len() {
            if !text.contains(PLACEHOLDER_OPEN) {
                break;
            }
            text = PLACEHOLDER
                .replace_all(&text, |caps: &Captures| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| self.saved.get(i))
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned();
        }
        text
    }
}

/// Links bare URLs outside code and existing links.
pub fn link_bare_urls(markdown: &str) -> Cow<'_, str> {
    if !markdown.contains("http://") && !markdown.contains("https://") {
        return Cow::Borrowed(markdown);
    }

    let mut stash = Stash::default();
    let text = stash.protect(&FENCED_CODE, markdown).into_owned();
    let text = stash.protect(&INLINE_CODE, &text).into_owned();
    let text = stash.protect(&MARKDOWN_LINK, &text).into_owned();

    let linked = BARE_URL.replace_all(&text, |caps: &Captures| {
        let prefix = &caps[1];
        let url = &caps[2];
        let trimmed = url.trim_end_matches(TRAILING_PUNCTUATION);
        let trimmed = trim_unbalanced_paren(trimmed);
        let tail = &url[trimmed.len()..];
        format!("{prefix}[{trimmed}]({trimmed}){tail}")
    });

    Cow::Owned(stash.restore(linked.into_owned()))
}

/// `(see https://x.com/a)` should not swallow the closing paren, while
/// `https://en.wikipedia.org/wiki/Rust_(programming_language)` keeps it.
fn trim_unbalanced_paren(url: &str) -> &str {
    let mut end = url;
    while end.ends_with(')') && end.matches(')').count() > end.matches('(').count() {
        end = &end[..end.len() - 1];
    }
    end
}
