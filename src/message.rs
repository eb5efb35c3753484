use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::markdown::{contains_markdown, contains_markdown_link};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Ai,
}

/// One entry of a conversation as the view holds it. The render pipeline
/// only ever reads a snapshot of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub kind: MessageKind,
    pub content: String,
    #[serde(default)]
    pub is_streaming: bool,
}

impl ChatMessage {
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::User,
            content: content.into(),
            is_streaming: false,
        }
    }

    pub fn ai(id: impl Into<String>, content: impl Into<String>, is_streaming: bool) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Ai,
            content: content.into(),
            is_streaming,
        }
    }

    pub fn push_chunk(&mut self, chunk: &str) {
        self.content.push_str(chunk);
    }

    /// Error text when an AI message is really a provider error payload such
    /// as `{"error": {"message": "rate limited"}}`.
    pub fn api_error(&self) -> Option<String> {
        if self.kind != MessageKind::Ai {
            return None;
        }
        let trimmed = self.content.trim();
        if !trimmed.starts_with('{') || !trimmed.contains("\"error\"") {
            return None;
        }
        let value: Value = serde_json::from_str(trimmed).ok()?;
        let error = value.as_object()?.get("error")?;
        is_truthy(error).then(|| error_text(error))
    }

    /// Whether the content goes through the markdown pipeline rather than
    /// being shown as plain text.
    pub fn needs_markdown(&self) -> bool {
        self.kind == MessageKind::Ai
            && self.api_error().is_none()
            && (contains_markdown(&self.content) || contains_markdown_link(&self.content))
    }
}

/// `null`, `false`, `0` and `""` do not mark a payload as an error.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(text) => text.clone(),
        Value::Object(fields) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => error.to_string(),
        },
        other => other.to_string(),
    }
}
