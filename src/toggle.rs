//! Expanded/collapsed state of completed thinking blocks.
//!
//! Blocks start collapsed. State is keyed by block id, so it survives the
//! block being re-rendered with identical content. Two ways in: a
//! process-wide registry behind free functions, or a [`ThinkingClickDelegate`]
//! owned by whoever handles clicks for a message list.

use std::collections::HashSet;
use std::sync::{LazyLock, Mutex, PoisonError};

pub trait ThinkingToggle {
    /// Flips the block and returns its new expanded state.
    fn toggle(&mut self, block_id: &str) -> bool;

    fn is_expanded(&self, block_id: &str) -> bool;
}

#[derive(Debug, Default, Clone)]
pub struct ToggleRegistry {
    expanded: HashSet<String>,
}

impl ToggleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }
}

impl ThinkingToggle for ToggleRegistry {
    fn toggle(&mut self, block_id: &str) -> bool {
        if self.expanded.remove(block_id) {
            false
        } else {
            self.expanded.insert(block_id.to_string());
            true
        }
    }

    fn is_expanded(&self, block_id: &str) -> bool {
        self.expanded.contains(block_id)
    }
}

static REGISTRY: LazyLock<Mutex<ToggleRegistry>> = LazyLock::new(|| Mutex::new(ToggleRegistry::new()));

/// Flips `block_id` in the global registry.
pub fn toggle_thinking(block_id: &str) -> bool {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner).toggle(block_id)
}

pub fn is_thinking_expanded(block_id: &str) -> bool {
    REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .is_expanded(block_id)
}

/// Click handling for a whole message list: resolves the block a click
/// landed on from its `data-block-id` and flips it.
#[derive(Debug, Default)]
pub struct ThinkingClickDelegate<T = ToggleRegistry> {
    state: T,
}

impl<T: ThinkingToggle> ThinkingClickDelegate<T> {
    pub fn new(state: T) -> Self {
        Self { state }
    }

    /// `attribute` is the `data-block-id` of the click target, if any.
    /// Returns the block id and its new state when the click was on a toggle.
    pub fn handle_click<'a>(&mut self, attribute: Option<&'a str>) -> Option<(&'a str, bool)> {
        let block_id = attribute.map(str::trim).filter(|id| !id.is_empty())?;
        Some((block_id, self.state.toggle(block_id)))
    }

    pub fn is_expanded(&self, block_id: &str) -> bool {
        self.state.is_expanded(block_id)
    }

    pub fn state(&self) -> &T {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_start_collapsed_and_flip() {
        let mut registry = ToggleRegistry::new();
        assert!(!registry.is_expanded("b1"));
        assert!(registry.toggle("b1"));
        assert!(registry.is_expanded("b1"));
        assert!(!registry.toggle("b1"));
        assert!(!registry.is_expanded("b1"));
    }

    #[test]
    fn blocks_are_independent() {
        let mut registry = ToggleRegistry::new();
        registry.toggle("a");
        assert!(!registry.is_expanded("b"));
        registry.collapse_all();
        assert!(!registry.is_expanded("a"));
    }

    #[test]
    fn global_registry_round_trip() {
        let id = "toggle-test-global-block";
        assert!(!is_thinking_expanded(id));
        assert!(toggle_thinking(id));
        assert!(is_thinking_expanded(id));
        assert!(!toggle_thinking(id));
    }

    #[test]
    fn delegate_ignores_clicks_without_a_block() {
        let mut delegate = ThinkingClickDelegate::<ToggleRegistry>::default();
        assert_eq!(delegate.handle_click(None), None);
        assert_eq!(delegate.handle_click(Some("  ")), None);
        assert_eq!(delegate.handle_click(Some("m1-thinkingComplete-0-abc")), Some(("m1-thinkingComplete-0-abc", true)));
        assert!(delegate.is_expanded("m1-thinkingComplete-0-abc"));
    }
}
