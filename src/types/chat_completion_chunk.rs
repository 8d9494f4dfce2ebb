use serde::{Deserialize, Serialize};

use crate::types::Role;

/// One incremental piece of a streamed chat completion.
///
/// The server emits a sequence of chunks, each carrying a partial-content
/// delta for its choices; concatenating the deltas of the first choice
/// reproduces the full reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatCompletionChunk {
    /// Request identifier echoed on every chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The choices updated by this chunk.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A single choice within a streamed chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChunkChoice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The incremental update to this choice's message.
    #[serde(default)]
    pub delta: MessageDelta,

    /// Why generation stopped, present only on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// The incremental update carried by a chunk choice.
///
/// Both fields are optional on the wire; an absent `content` means the
/// chunk contributed no text and is not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MessageDelta {
    /// Role of the message being streamed, usually only on the first chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// The text appended by this chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Create a chunk carrying a single text delta for the first choice.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            choices: vec![ChunkChoice {
                index: 0,
                delta: MessageDelta {
                    role: None,
                    content: Some(text.into()),
                },
                finish_reason: None,
            }],
        }
    }

    /// Returns the text delta of the first choice.
    ///
    /// An absent choice, delta, or content field yields the empty string.
    pub fn delta_text(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn parses_content_delta() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "id": "8855",
            "created": 1700000000,
            "model": "glm-4",
            "choices": [{"index": 0, "delta": {"role": "assistant", "content": "Hel"}}]
        }))
        .unwrap();

        assert_eq!(chunk.delta_text(), "Hel");
        assert_eq!(chunk.id.as_deref(), Some("8855"));
        assert_eq!(chunk.choices[0].delta.role, Some(Role::Assistant));
    }

    #[test]
    fn absent_content_is_empty_text() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "choices": [{"index": 0, "delta": {}}]
        }))
        .unwrap();
        assert_eq!(chunk.delta_text(), "");

        let chunk: ChatCompletionChunk = from_value(json!({
            "choices": [{"index": 0, "delta": {"content": null}}]
        }))
        .unwrap();
        assert_eq!(chunk.delta_text(), "");
    }

    #[test]
    fn absent_choices_is_empty_text() {
        let chunk: ChatCompletionChunk = from_value(json!({"id": "x"})).unwrap();
        assert_eq!(chunk.delta_text(), "");
    }

    #[test]
    fn final_chunk_carries_finish_reason() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(chunk.delta_text(), "");
    }

    #[test]
    fn from_text_round_trip() {
        let chunk = ChatCompletionChunk::from_text("world");
        assert_eq!(chunk.delta_text(), "world");
    }
}
