//! Error type for the rendering core.
//!
//! None of these escape [`crate::blocks::BlockAssembler`] or
//! [`crate::markdown::MarkdownRenderer::render`]; both recover by falling back
//! to escaped plain text. They are public so callers of the fallible
//! `try_*` entry points can inspect them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("html sanitizer failed: {0}")]
    Sanitize(#[from] lol_html::errors::RewritingError),

    #[error("syntax highlighting failed: {0}")]
    Highlight(#[from] syntect::Error),

    #[error("rewritten html is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
