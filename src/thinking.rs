//! Splitting of `<think>…</think>` reasoning traces out of model output.
//!
//! The tag convention is a flat, alternating stream: a tag is *structural*
//! only when it flips the inside/outside state. A `<think>` seen while
//! already inside a block, or a `</think>` seen outside one, is kept as
//! literal text. Tags are matched ASCII case-insensitively.
//!
//! Outside of thinking regions the scanner tracks fenced code blocks and
//! ignores tags inside them, so a code sample that mentions `<think>` does
//! not open a block. Fences are deliberately not tracked inside a thinking
//! region: an unbalanced fence in reasoning text must not hide the closer.

const OPEN_TAG: &str = "<think>";
const CLOSE_TAG: &str = "</think>";

/// One piece of the structural token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    /// A structural `<think>`, with its byte offset in the source.
    Open(usize),
    /// A structural `</think>`, with its byte offset in the source.
    Close(usize),
}

/// Result of the complete split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThinkingSplit {
    pub segments: Vec<String>,
    pub answer: String,
}

/// Result of the streaming split: renderable content before the open
/// thinking region and the region's content so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingSplit<'a> {
    pub before: &'a str,
    pub in_progress: &'a str,
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: u8,
    len: usize,
}

/// Tokenized view of one buffer.
#[derive(Debug, Clone)]
pub struct ThinkingScan<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    opened: usize,
    closed: usize,
}

impl<'a> ThinkingScan<'a> {
    /// Scans with fenced-code protection on.
    pub fn new(source: &'a str) -> Self {
        Self::with_fence_protection(source, true)
    }

    pub fn with_fence_protection(source: &'a str, protect_fences: bool) -> Self {
        let tokens = tokenize(source, protect_fences);
        let opened = tokens.iter().filter(|t| matches!(t, Token::Open(_))).count();
        let closed = tokens.iter().filter(|t| matches!(t, Token::Close(_))).count();
        Self {
            source,
            tokens,
            opened,
            closed,
        }
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn opened(&self) -> usize {
        self.opened
    }

    pub fn closed(&self) -> usize {
        self.closed
    }

    pub fn has_thinking(&self) -> bool {
        self.opened > 0
    }

    /// Every structural opener has its closer.
    pub fn is_complete(&self) -> bool {
        self.opened > 0 && self.opened == self.closed
    }

    /// The buffer ends inside a thinking region.
    pub fn is_incomplete(&self) -> bool {
        self.opened > self.closed
    }

    /// Splits into ordered thinking segments and the trailing answer.
    ///
    /// An unterminated final region is pushed as a last segment too.
    pub fn split(&self) -> ThinkingSplit {
        let mut split = ThinkingSplit::default();
        let mut answer = String::with_capacity(self.source.len());
        let mut current = String::new();
        let mut inside = false;

        for token in &self.tokens {
            match *token {
                Token::Text(text) if inside => current.push_str(text),
                Token::Text(text) => answer.push_str(text),
                Token::Open(_) => inside = true,
                Token::Close(_) => {
                    split.segments.push(current.trim().to_string());
                    current.clear();
                    inside = false;
                }
            }
        }
        if inside {
            split.segments.push(current.trim().to_string());
        }
        split.answer = answer.trim().to_string();
        split
    }

    /// Splits at the opener of the still-open region. `None` unless the
    /// buffer ends inside a thinking region.
    pub fn split_streaming(&self) -> Option<StreamingSplit<'a>> {
        if !self.is_incomplete() {
            return None;
        }
        let open_at = self.tokens.iter().rev().find_map(|t| match t {
            Token::Open(at) => Some(*at),
            _ => None,
        })?;
        let before = &self.source[..open_at];
        let rest = &self.source[open_at + OPEN_TAG.len()..];
        Some(StreamingSplit {
            before,
            in_progress: strip_partial_tag(rest),
        })
    }
}

/// Complete split with default fence protection.
pub fn split(text: &str) -> ThinkingSplit {
    ThinkingScan::new(text).split()
}

/// Streaming split with default fence protection.
pub fn split_streaming(text: &str) -> Option<StreamingSplit<'_>> {
    ThinkingScan::new(text).split_streaming()
}

/// Drops a trailing, not yet complete `<think>` / `</think>` prefix so a
/// tag cut in half by a chunk boundary never flashes as literal text.
pub fn strip_partial_tag(text: &str) -> &str {
    let Some(lt) = text.rfind('<') else { return text };
    let tail = &text[lt..];
    let is_prefix_of = |tag: &str| {
        tail.len() < tag.len() && tag.as_bytes()[..tail.len()].eq_ignore_ascii_case(tail.as_bytes())
    };
    if tail.len() > 1 && (is_prefix_of(OPEN_TAG) || is_prefix_of(CLOSE_TAG)) {
        &text[..lt]
    } else {
        text
    }
}

fn starts_with_tag(rest: &str, tag: &str) -> bool {
    rest.len() >= tag.len() && rest.as_bytes()[..tag.len()].eq_ignore_ascii_case(tag.as_bytes())
}

/// Recognises a fence line (up to three spaces of indent, then three or more
/// backticks or tildes).
fn fence_of(line: &str) -> Option<Fence> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = line[indent..].as_bytes();
    let marker = *rest.first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = rest.iter().take_while(|&&b| b == marker).count();
    (len >= 3).then_some(Fence { marker, len })
}

fn closes(open: Fence, line: &str) -> bool {
    match fence_of(line) {
        Some(fence) => {
            let after = line.trim_start_matches(' ');
            fence.marker == open.marker
                && fence.len >= open.len
                && after[fence.len..].trim().is_empty()
        }
        None => false,
    }
}

fn tokenize(source: &str, protect_fences: bool) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut inside = false;
    let mut fence: Option<Fence> = None;
    let mut text_start = 0;
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if !inside && protect_fences {
            if let Some(open) = fence {
                if closes(open, line) {
                    fence = None;
                }
                continue;
            }
            if let Some(open) = fence_of(line) {
                fence = Some(open);
                continue;
            }
        }

        let mut cursor = 0;
        while let Some(found) = line[cursor..].find('<') {
            let at = cursor + found;
            let rest = &line[at..];
            let tag_len = if !inside && starts_with_tag(rest, OPEN_TAG) {
                OPEN_TAG.len()
            } else if inside && starts_with_tag(rest, CLOSE_TAG) {
                CLOSE_TAG.len()
            } else {
                cursor = at + 1;
                continue;
            };

            let abs = line_start + at;
            if text_start < abs {
                tokens.push(Token::Text(&source[text_start..abs]));
            }
            tokens.push(if inside { Token::Close(abs) } else { Token::Open(abs) });
            inside = !inside;
            text_start = abs + tag_len;
            cursor = at + tag_len;
        }
    }
    if text_start < source.len() {
        tokens.push(Token::Text(&source[text_start..]));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_blocks_split_into_segments_and_answer() {
        let split = split("A<think>B</think>C<think>D</think>E");
        assert_eq!(split.segments, vec!["B", "D"]);
        assert_eq!(split.answer, "ACE");
    }

    #[test]
    fn segments_and_answer_are_trimmed() {
        let split = split("<think>\n  pondering  \n</think>\n\nThe answer.\n");
        assert_eq!(split.segments, vec!["pondering"]);
        assert_eq!(split.answer, "The answer.");
    }

    #[test]
    fn tags_are_case_insensitive() {
        let scan = ThinkingScan::new("<THINK>x</Think>y");
        assert!(scan.is_complete());
        assert_eq!(scan.split().segments, vec!["x"]);
        assert_eq!(scan.split().answer, "y");
    }

    #[test]
    fn stray_closer_is_literal_text() {
        let scan = ThinkingScan::new("X </think> Y");
        assert_eq!(scan.opened(), 0);
        assert!(!scan.has_thinking());
        assert_eq!(scan.split().answer, "X </think> Y");
        assert!(scan.split().segments.is_empty());
    }

    #[test]
    fn nested_opener_is_literal_inside_a_block() {
        let split = split("<think>a <think> b</think>c");
        assert_eq!(split.segments, vec!["a <think> b"]);
        assert_eq!(split.answer, "c");
    }

    #[test]
    fn unterminated_block_is_pushed_defensively() {
        let scan = ThinkingScan::new("intro<think>still going");
        assert!(scan.is_incomplete());
        let split = scan.split();
        assert_eq!(split.segments, vec!["still going"]);
        assert_eq!(split.answer, "intro");
    }

    #[test]
    fn streaming_split_uses_the_open_region() {
        let s = split_streaming("Hello <think>weighing options").unwrap();
        assert_eq!(s.before, "Hello ");
        assert_eq!(s.in_progress, "weighing options");

        let s = split_streaming("<think>a</think>middle<think>b so far").unwrap();
        assert_eq!(s.before, "<think>a</think>middle");
        assert_eq!(s.in_progress, "b so far");

        assert!(split_streaming("<think>a</think>done").is_none());
        assert!(split_streaming("no tags").is_none());
    }

    #[test]
    fn streaming_split_withholds_partial_closer() {
        let s = split_streaming("<think>almost there</thi").unwrap();
        assert_eq!(s.in_progress, "almost there");
        let s = split_streaming("<think>a < b").unwrap();
        assert_eq!(s.in_progress, "a < b");
    }

    #[test]
    fn tags_inside_answer_fences_are_literal() {
        let text = "Use it like this:\n```html\n<think>example</think>\n```\nDone.";
        let scan = ThinkingScan::new(text);
        assert!(!scan.has_thinking());
        assert_eq!(scan.split().answer, text);
    }

    #[test]
    fn fence_protection_can_be_disabled() {
        let text = "```\n<think>x</think>\n```";
        let scan = ThinkingScan::with_fence_protection(text, false);
        assert_eq!(scan.opened(), 1);
        assert_eq!(scan.split().segments, vec!["x"]);
    }

    #[test]
    fn fences_inside_thinking_do_not_hide_the_closer() {
        let text = "<think>\n```rust\nfn half_written(\n</think>\nAnswer";
        let scan = ThinkingScan::new(text);
        assert!(scan.is_complete());
        assert_eq!(scan.split().answer, "Answer");
    }

    #[test]
    fn tilde_fence_needs_matching_marker_to_close() {
        let text = "~~~\n```\n<think>literal</think>\n~~~\n<think>real</think>";
        let split = split(text);
        assert_eq!(split.segments, vec!["real"]);
    }

    #[test]
    fn partial_tag_stripping() {
        assert_eq!(strip_partial_tag("text <thi"), "text ");
        assert_eq!(strip_partial_tag("text </THINK"), "text ");
        assert_eq!(strip_partial_tag("text <"), "text <");
        assert_eq!(strip_partial_tag("a <b> c"), "a <b> c");
        assert_eq!(strip_partial_tag("x <think>"), "x <think>");
    }
}
