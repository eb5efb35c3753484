//! Markdown side of the pipeline: classification, hashing and the
//! sanitizing HTML renderer.

pub mod classify;
pub mod code_block;
pub mod hash;
pub mod highlight;
pub mod preprocess;
pub mod render;
pub mod sanitize;

pub use classify::{
    contains_markdown, contains_markdown_link, contains_thinking_blocks, has_complete_thinking_blocks,
    has_incomplete_thinking_blocks,
};
pub use code_block::{CodeSnippet, extract_code_blocks};
pub use hash::{ContentHash, content_hash};
pub use render::MarkdownRenderer;
pub use sanitize::sanitize_html;
