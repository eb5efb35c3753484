use serde::{Deserialize, Serialize};

use crate::cache::{BLOCK_CACHE_CAPACITY, DOCUMENT_CACHE_CAPACITY};

/// Tunables for the rendering pipeline. Every field has a default, so a
/// partial (or empty) settings file is valid.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    pub document_cache_capacity: usize,
    pub block_cache_capacity: usize,
    pub code_block: CodeBlockSettings,
    /// Longest path shown in the label of a shortened auto-link.
    pub link_path_max_chars: usize,
    /// Treat thinking tags inside fenced code as literal text.
    pub protect_fenced_code: bool,
    pub smart_punctuation: bool,
    /// Render single newlines as line breaks.
    pub hard_breaks: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CodeBlockSettings {
    /// Blocks longer than this are `medium`.
    pub medium_lines: usize,
    /// Blocks longer than this are `large`.
    pub large_lines: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            document_cache_capacity: DOCUMENT_CACHE_CAPACITY,
            block_cache_capacity: BLOCK_CACHE_CAPACITY,
            code_block: CodeBlockSettings::default(),
            link_path_max_chars: 15,
            protect_fenced_code: true,
            smart_punctuation: true,
            hard_breaks: true,
        }
    }
}

impl Default for CodeBlockSettings {
    fn default() -> Self {
        Self {
            medium_lines: 15,
            large_lines: 30,
        }
    }
}

impl RenderSettings {
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(RenderSettings::from_json("{}").unwrap(), RenderSettings::default());
    }

    #[test]
    fn partial_document_overrides_only_given_fields() {
        let settings =
            RenderSettings::from_json(r#"{"block_cache_capacity": 8, "code_block": {"large_lines": 60}}"#).unwrap();
        assert_eq!(settings.block_cache_capacity, 8);
        assert_eq!(settings.document_cache_capacity, DOCUMENT_CACHE_CAPACITY);
        assert_eq!(settings.code_block.large_lines, 60);
        assert_eq!(settings.code_block.medium_lines, 15);
        assert!(settings.protect_fenced_code);
    }

    #[test]
    fn json_round_trip() {
        let settings = RenderSettings {
            hard_breaks: false,
            ..RenderSettings::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(RenderSettings::from_json(&json).unwrap(), settings);
    }
}
