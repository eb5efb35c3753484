//! Wiring for the copy buttons the renderer puts in every code header.
//!
//! The button carries the raw code percent-encoded in `data-code`. After a
//! message is mounted its fragments are scanned once; each button gets a
//! stable id and clicking it hands the decoded code to the clipboard
//! callback.

use lol_html::{HtmlRewriter, Settings, element};
use tracing::warn;

use crate::markdown::code_block::decode_copy_payload;

const COPY_BUTTON_SELECTOR: &str = "button.copy-code-button[data-code]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyButton {
    /// `code-{message_id}-{index}`, index in document order.
    pub id: String,
    pub code: String,
}

pub struct CopyButtons<F> {
    buttons: Vec<CopyButton>,
    on_copy: F,
}

impl<F> CopyButtons<F>
where
    F: FnMut(&str, &str),
{
    pub fn buttons(&self) -> &[CopyButton] {
        &self.buttons
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Copies the code of the `index`th bound button. False when there is
    /// no such button.
    pub fn click(&mut self, index: usize) -> bool {
        match self.buttons.get(index) {
            Some(button) => {
                (self.on_copy)(&button.code, &button.id);
                true
            }
            None => false,
        }
    }

    pub fn click_id(&mut self, id: &str) -> bool {
        match self.buttons.iter().position(|button| button.id == id) {
            Some(index) => self.click(index),
            None => false,
        }
    }
}

/// Raw `data-code` payloads in document order.
fn scan_payloads<'a>(fragments: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut payloads = Vec::new();
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!(COPY_BUTTON_SELECTOR, |el| {
                if let Some(payload) = el.get_attribute("data-code") {
                    payloads.push(payload);
                }
                Ok(())
            })],
            ..Settings::default()
        },
        |_: &[u8]| {},
    );

    for fragment in fragments {
        if let Err(err) = rewriter.write(fragment.as_bytes()) {
            warn!(error = %err, "failed to scan rendered html for copy buttons");
            break;
        }
    }
    if let Err(err) = rewriter.end() {
        warn!(error = %err, "failed to finish copy button scan");
    }
    payloads
}

/// Binds every copy button found in `html_fragments` (a message's mounted
/// blocks, in order).
pub fn initialize_code_block_copy_buttons<'a, F>(
    message_id: &str,
    html_fragments: impl IntoIterator<Item = &'a str>,
    on_copy: F,
) -> CopyButtons<F>
where
    F: FnMut(&str, &str),
{
    let buttons = scan_payloads(html_fragments)
        .into_iter()
        .enumerate()
        .filter_map(|(index, payload)| {
            let id = format!("code-{message_id}-{index}");
            match decode_copy_payload(&payload) {
                Some(code) => Some(CopyButton { id, code }),
                None => {
                    warn!(%id, "copy button payload is not valid utf-8, skipping");
                    None
                }
            }
        })
        .collect();
    CopyButtons { buttons, on_copy }
}
