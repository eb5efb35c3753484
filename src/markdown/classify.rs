//! Cheap, side-effect free questions about a text buffer.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

use crate::thinking::ThinkingScan;

/// Patterns that mark a buffer as worth sending through the markdown
/// pipeline rather than showing it as plain text.
static MARKDOWN_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"#{1,6}\s+\w+",           // headings
        r"\*\*[\w\s]+\*\*",        // bold
        r"\*[\w\s]+\*",            // italic
        r"\[.+?\]\(.+?\)",         // bracketed links
        r"https?://\S+",           // bare urls
        r"```[\w\s]+",             // fenced code
        r"`[^`]+`",                // inline code
        r"- [\w\s]+",              // bulleted lists
        r"\d+\. [\w\s]+",          // numbered lists
        r"\|\s*[\w\s]+\s*\|",      // table rows
        r">\s+[\w\s]+",            // blockquotes
        r"(?i)</?think>",          // thinking tags
    ])
    .expect("markdown classifier patterns are valid")
});

static THINKING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?think>").expect("thinking tag pattern is valid"));

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.+?\]\(.+?\)").expect("markdown link pattern is valid"));

pub fn contains_markdown(text: &str) -> bool {
    MARKDOWN_PATTERNS.is_match(text)
}

/// `[text](url)` anywhere in the buffer.
pub fn contains_markdown_link(text: &str) -> bool {
    MARKDOWN_LINK.is_match(text)
}

/// Either tag anywhere, structural or not. Catches the streaming case where
/// only the opener has arrived.
pub fn contains_thinking_blocks(text: &str) -> bool {
    THINKING_TAG.is_match(text)
}

/// At least one thinking block and every opener closed.
pub fn has_complete_thinking_blocks(text: &str) -> bool {
    ThinkingScan::new(text).is_complete()
}

/// More openers than closers: a block is still being streamed.
pub fn has_incomplete_thinking_blocks(text: &str) -> bool {
    ThinkingScan::new(text).is_incomplete()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_markdown() {
        assert!(contains_markdown("# Title"));
        assert!(contains_markdown("this is **bold** text"));
        assert!(contains_markdown("see [docs](https://example.com)"));
        assert!(contains_markdown("visit https://example.com today"));
        assert!(contains_markdown("```rust\nfn main() {}\n```"));
        assert!(contains_markdown("run `cargo test`"));
        assert!(contains_markdown("- first item"));
        assert!(contains_markdown("1. first step"));
        assert!(contains_markdown("| a | b |"));
        assert!(contains_markdown("> quoted words"));
        assert!(contains_markdown("<think>hmm"));
    }

    #[test]
    fn plain_prose_is_not_markdown() {
        assert!(!contains_markdown("Hello there, how are you?"));
        assert!(!contains_markdown("The price is 5 dollars."));
    }

    #[test]
    fn thinking_tag_presence_is_case_insensitive() {
        assert!(contains_thinking_blocks("<THINK>"));
        assert!(contains_thinking_blocks("only a </think> closer"));
        assert!(!contains_thinking_blocks("<thinking>"));
    }

    #[test]
    fn complete_and_incomplete_are_count_based() {
        assert!(has_complete_thinking_blocks("<think>a</think>b"));
        assert!(!has_incomplete_thinking_blocks("<think>a</think>b"));

        assert!(has_incomplete_thinking_blocks("<think>a"));
        assert!(!has_complete_thinking_blocks("<think>a"));

        assert!(!has_complete_thinking_blocks("no tags"));
        assert!(!has_incomplete_thinking_blocks("no tags"));
        assert!(!has_complete_thinking_blocks("x </think> y"));
        assert!(!has_incomplete_thinking_blocks("x </think> y"));
    }

    #[test]
    fn markdown_link_detection() {
        assert!(contains_markdown_link("[a](b)"));
        assert!(!contains_markdown_link("[a] (b)"));
    }
}
