//! Turns one message buffer into an ordered list of render blocks.
//!
//! Each `(message_id, content, is_streaming)` snapshot maps to a
//! deterministic block list. Whole lists are cached per snapshot, and the
//! HTML of individual blocks is cached by block id, so while a reply streams
//! only the block that actually grew gets rendered again.

use std::borrow::Cow;
use std::fmt;

use html_escape::encode_double_quoted_attribute;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_settings::RenderSettings;
use crate::cache::FifoCache;
use crate::markdown::{ContentHash, MarkdownRenderer, content_hash};
use crate::thinking::{ThinkingScan, strip_partial_tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    /// The reasoning region the model is still writing.
    ThinkingStreaming,
    /// A closed reasoning region, collapsed by default.
    ThinkingComplete,
    /// Reply text outside reasoning regions.
    Answer,
    /// A reply with no reasoning at all.
    Markdown,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::ThinkingStreaming => "thinkingStreaming",
            BlockKind::ThinkingComplete => "thinkingComplete",
            BlockKind::Answer => "answer",
            BlockKind::Markdown => "markdown",
        }
    }

    pub fn is_thinking(self) -> bool {
        matches!(self, BlockKind::ThinkingStreaming | BlockKind::ThinkingComplete)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderBlock {
    /// `{message_id}-{kind}-{index}-{hash}`
    pub id: String,
    pub kind: BlockKind,
    /// Sanitized, safe to mount.
    pub html: String,
    pub message_id: String,
    pub content_hash: ContentHash,
}

const COLLAPSED_TOGGLE: &str = "aria-expanded=\"false\"";
const EXPANDED_TOGGLE: &str = "aria-expanded=\"true\"";
const COLLAPSED_CONTENT: &str = "class=\"thinking-content collapsed\"";
const EXPANDED_CONTENT: &str = "class=\"thinking-content\"";

impl RenderBlock {
    /// The block's markup with a completed thinking region shown open or
    /// closed. Cached markup is always collapsed; other kinds are returned
    /// unchanged.
    pub fn html_with_expanded(&self, expanded: bool) -> Cow<'_, str> {
        if self.kind != BlockKind::ThinkingComplete || !expanded {
            return Cow::Borrowed(&self.html);
        }
        // The wrapper markup precedes the body, so the first match is ours.
        Cow::Owned(
            self.html
                .replacen(COLLAPSED_TOGGLE, EXPANDED_TOGGLE, 1)
                .replacen(COLLAPSED_CONTENT, EXPANDED_CONTENT, 1),
        )
    }
}

/// How a mounted block list has to change to show a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderUpdate {
    Unchanged,
    /// Exactly one block differs; swap it in place.
    Patch { index: usize, block: RenderBlock },
    Replace(Vec<RenderBlock>),
}

impl RenderUpdate {
    /// Compares by block id, which covers kind, position and content.
    pub fn between(previous: &[RenderBlock], next: Vec<RenderBlock>) -> Self {
        if previous.len() != next.len() {
            return RenderUpdate::Replace(next);
        }
        let mut changed = previous
            .iter()
            .zip(&next)
            .enumerate()
            .filter(|(_, (old, new))| old.id != new.id)
            .map(|(index, _)| index);

        match (changed.next(), changed.next()) {
            (None, _) => RenderUpdate::Unchanged,
            (Some(index), None) => match next.into_iter().nth(index) {
                Some(block) => RenderUpdate::Patch { index, block },
                None => RenderUpdate::Unchanged,
            },
            (Some(_), Some(_)) => RenderUpdate::Replace(next),
        }
    }

    /// Applies the update to a mounted list.
    pub fn apply_to(self, mounted: &mut Vec<RenderBlock>) {
        match self {
            RenderUpdate::Unchanged => {}
            RenderUpdate::Patch { index, block } => {
                if let Some(slot) = mounted.get_mut(index) {
                    *slot = block;
                }
            }
            RenderUpdate::Replace(blocks) => *mounted = blocks,
        }
    }
}

#[derive(Debug)]
pub struct BlockAssembler {
    renderer: MarkdownRenderer,
    documents: FifoCache<String, Vec<RenderBlock>>,
    block_html: FifoCache<String, String>,
}

impl Default for BlockAssembler {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl BlockAssembler {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            documents: FifoCache::new(settings.document_cache_capacity),
            block_html: FifoCache::new(settings.block_cache_capacity),
            renderer: MarkdownRenderer::new(settings),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        self.renderer.settings()
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    /// Number of cached documents and cached block fragments.
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.documents.len(), self.block_html.len())
    }

    pub fn clear_caches(&mut self) {
        self.documents.clear();
        self.block_html.clear();
    }

    pub fn assemble(&mut self, message_id: &str, content: &str, is_streaming: bool) -> Vec<RenderBlock> {
        let key = format!("{message_id}-{}-{is_streaming}", content_hash(content));
        if let Some(blocks) = self.documents.get(&key) {
            debug!(%key, "document cache hit");
            return blocks.clone();
        }

        debug!(%key, "document cache miss");
        let blocks = self.build(message_id, content, is_streaming);
        let evicted = self.documents.insert(key, blocks.clone());
        if evicted > 0 {
            debug!(evicted, "document cache full, evicted oldest entries");
        }
        blocks
    }

    /// Assembles the snapshot and diffs it against the mounted blocks.
    pub fn update(
        &mut self,
        message_id: &str,
        content: &str,
        is_streaming: bool,
        previous: &[RenderBlock],
    ) -> RenderUpdate {
        let blocks = self.assemble(message_id, content, is_streaming);
        RenderUpdate::between(previous, blocks)
    }

    fn build(&mut self, message_id: &str, content: &str, is_streaming: bool) -> Vec<RenderBlock> {
        // A tag cut by the chunk boundary shows up once it is complete.
        let content = if is_streaming { strip_partial_tag(content) } else { content };
        let protect = self.settings().protect_fenced_code;
        let scan = ThinkingScan::with_fence_protection(content, protect);
        if !scan.has_thinking() {
            return vec![self.block(message_id, BlockKind::Markdown, 0, content)];
        }

        if is_streaming && let Some(split) = scan.split_streaming() {
            debug!(message_id, "thinking region still open");
            let before = ThinkingScan::with_fence_protection(split.before, protect);
            let mut blocks = if before.has_thinking() {
                self.complete_blocks(message_id, &before)
            } else if split.before.trim().is_empty() {
                Vec::new()
            } else {
                vec![self.block(message_id, BlockKind::Markdown, 0, split.before)]
            };
            // The open region is the next segment in order.
            let index = before.opened();
            blocks.push(self.block(message_id, BlockKind::ThinkingStreaming, index, split.in_progress));
            return blocks;
        }

        self.complete_blocks(message_id, &scan)
    }

    fn complete_blocks(&mut self, message_id: &str, scan: &ThinkingScan<'_>) -> Vec<RenderBlock> {
        let split = scan.split();
        let mut blocks = Vec::with_capacity(split.segments.len() + 1);
        for (index, segment) in split.segments.iter().enumerate() {
            if segment.is_empty() {
                continue;
            }
            blocks.push(self.block(message_id, BlockKind::ThinkingComplete, index, segment));
        }
        if !split.answer.is_empty() {
            blocks.push(self.block(message_id, BlockKind::Answer, 0, &split.answer));
        }
        blocks
    }

    fn block(&mut self, message_id: &str, kind: BlockKind, index: usize, content: &str) -> RenderBlock {
        let hash = content_hash(content);
        let id = format!("{message_id}-{kind}-{index}-{hash}");
        let html = match self.block_html.get(&id) {
            Some(html) => html.clone(),
            None => {
                let html = self.render_block(kind, &id, content);
                self.block_html.insert(id.clone(), html.clone());
                html
            }
        };
        RenderBlock {
            id,
            kind,
            html,
            message_id: message_id.to_string(),
            content_hash: hash,
        }
    }

    fn render_block(&self, kind: BlockKind, id: &str, content: &str) -> String {
        let body = self.renderer.render(content);
        let id = encode_double_quoted_attribute(id);
        match kind {
            BlockKind::Markdown => format!("<div class=\"markdown-block\" data-block-id=\"{id}\">{body}</div>"),
            BlockKind::Answer => format!("<div class=\"answer-block\" data-block-id=\"{id}\">{body}</div>"),
            BlockKind::ThinkingStreaming => format!(
                concat!(
                    "<div class=\"thinking-block streaming\" data-block-id=\"{id}\">",
                    "<div class=\"thinking-header\">",
                    "<span class=\"thinking-indicator\" aria-hidden=\"true\"></span>",
                    "<span class=\"thinking-title\">Thinking...</span>",
                    "</div>",
                    "<div class=\"thinking-content\">{body}</div>",
                    "</div>"
                ),
                id = id,
                body = body,
            ),
            BlockKind::ThinkingComplete => format!(
                concat!(
                    "<div class=\"thinking-block complete\" data-block-id=\"{id}\">",
                    "<button class=\"thinking-toggle\" type=\"button\" data-block-id=\"{id}\" aria-expanded=\"false\">",
                    "<span class=\"thinking-chevron\" aria-hidden=\"true\"></span>",
                    "<span class=\"thinking-title\">Thought process</span>",
                    "</button>",
                    "<div class=\"thinking-content collapsed\">{body}</div>",
                    "</div>"
                ),
                id = id,
                body = body,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[RenderBlock]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn plain_reply_is_one_markdown_block() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "# Title\n\nHello **world**", false);
        assert_eq!(kinds(&blocks), vec![BlockKind::Markdown]);
        assert!(blocks[0].html.contains("<h1"));
        assert!(blocks[0].html.contains("<strong>world</strong>"));
        assert!(blocks[0].id.starts_with("m1-markdown-0-"));
        assert_eq!(blocks[0].message_id, "m1");
    }

    #[test]
    fn completed_reply_splits_into_segments_and_answer() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "A<think>B</think>C<think>D</think>E", false);
        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::ThinkingComplete, BlockKind::ThinkingComplete, BlockKind::Answer]
        );
        assert!(blocks[0].id.starts_with("m1-thinkingComplete-0-"));
        assert!(blocks[1].id.starts_with("m1-thinkingComplete-1-"));
        assert_eq!(blocks[2].content_hash, content_hash("ACE"));
        assert!(blocks[0].html.contains("aria-expanded=\"false\""));
        assert!(blocks[0].html.contains(&format!("data-block-id=\"{}\"", blocks[0].id)));
    }

    #[test]
    fn streaming_reply_ends_with_streaming_block() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "Intro<think>working on it", true);
        assert_eq!(kinds(&blocks), vec![BlockKind::Markdown, BlockKind::ThinkingStreaming]);
        assert_eq!(blocks[0].content_hash, content_hash("Intro"));
        assert!(blocks[1].html.contains("thinking-block streaming"));
        assert!(blocks[1].html.contains("working on it"));
    }

    #[test]
    fn streaming_after_completed_segments_keeps_them() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "<think>one</think>mid<think>tw", true);
        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::ThinkingComplete, BlockKind::Answer, BlockKind::ThinkingStreaming]
        );
        assert!(blocks[2].id.starts_with("m1-thinkingStreaming-1-"));
    }

    #[test]
    fn partial_closer_is_withheld_while_streaming() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "<think>almost done</thi", true);
        assert_eq!(kinds(&blocks), vec![BlockKind::ThinkingStreaming]);
        assert_eq!(blocks[0].content_hash, content_hash("almost done"));
        assert!(!blocks[0].html.contains("&lt;/thi"));
    }

    #[test]
    fn partial_opener_is_withheld_while_streaming() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "Hello <thi", true);
        assert_eq!(kinds(&blocks), vec![BlockKind::Markdown]);
        assert_eq!(blocks[0].content_hash, content_hash("Hello "));

        let blocks = assembler.assemble("m1", "Hello <thi", false);
        assert!(blocks[0].html.contains("&lt;thi"));
    }

    #[test]
    fn unterminated_region_in_final_render_is_still_shown() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "<think>cut off", false);
        assert_eq!(kinds(&blocks), vec![BlockKind::ThinkingComplete]);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "<think>  </think>answer", false);
        assert_eq!(kinds(&blocks), vec![BlockKind::Answer]);
    }

    #[test]
    fn repeated_assembly_is_identical_and_cached() {
        let mut assembler = BlockAssembler::default();
        let first = assembler.assemble("m1", "<think>a</think>b", false);
        let second = assembler.assemble("m1", "<think>a</think>b", false);
        assert_eq!(first, second);
        assert_eq!(assembler.cache_sizes().0, 1);
    }

    #[test]
    fn streaming_growth_patches_only_the_open_block() {
        let mut assembler = BlockAssembler::default();
        let mounted = assembler.assemble("m1", "Hi<think>step one", true);
        match assembler.update("m1", "Hi<think>step one, step two", true, &mounted) {
            RenderUpdate::Patch { index, block } => {
                assert_eq!(index, 1);
                assert_eq!(block.kind, BlockKind::ThinkingStreaming);
            }
            other => panic!("expected a patch, got {other:?}"),
        }
        assert_eq!(assembler.update("m1", "Hi<think>step one", true, &mounted), RenderUpdate::Unchanged);
    }

    #[test]
    fn finishing_a_region_replaces_the_list() {
        let mut assembler = BlockAssembler::default();
        let mut mounted = assembler.assemble("m1", "<think>plan", true);
        let update = assembler.update("m1", "<think>plan</think>Done.", false, &mounted);
        assert!(matches!(update, RenderUpdate::Replace(_)));
        update.apply_to(&mut mounted);
        assert_eq!(kinds(&mounted), vec![BlockKind::ThinkingComplete, BlockKind::Answer]);
    }

    #[test]
    fn block_ids_are_escaped_in_markup() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("a\"b", "<think>x</think>", false);
        assert!(blocks[0].html.contains("data-block-id=\"a&quot;b-thinkingComplete-0-"));
    }

    #[test]
    fn expanded_markup_tracks_toggle_state() {
        let mut assembler = BlockAssembler::default();
        let blocks = assembler.assemble("m1", "<think>plan</think>done", false);
        let thinking = &blocks[0];
        assert_eq!(thinking.kind, BlockKind::ThinkingComplete);

        assert_eq!(thinking.html_with_expanded(false), thinking.html.as_str());
        let open = thinking.html_with_expanded(true);
        assert!(open.contains("aria-expanded=\"true\""));
        assert!(open.contains("<div class=\"thinking-content\">"));
        assert!(!open.contains("thinking-content collapsed"));
        assert!(!open.contains("aria-expanded=\"false\""));
        assert!(open.contains("plan"));

        assert_eq!(blocks[1].html_with_expanded(true), blocks[1].html.as_str());
    }

    #[test]
    fn kinds_serialize_in_camel_case() {
        assert_eq!(serde_json::to_string(&BlockKind::ThinkingStreaming).unwrap(), "\"thinkingStreaming\"");
        assert_eq!(BlockKind::Markdown.to_string(), "markdown");
    }
}
