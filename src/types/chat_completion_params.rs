use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Model};

/// Parameters for a chat-completion request.
///
/// Every request carries the full ordered transcript; the API has no
/// server-side conversation state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionParams {
    /// The model to generate the completion with.
    pub model: Model,

    /// The conversation so far, oldest message first.
    pub messages: Vec<ChatMessage>,

    /// Whether to return the completion as a server-sent event stream.
    pub stream: bool,
}

impl ChatCompletionParams {
    /// Create parameters for a blocking (non-streamed) completion.
    pub fn new(model: Model, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            messages,
            stream: false,
        }
    }

    /// Create parameters for a streamed completion.
    pub fn new_streaming(model: Model, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            messages,
            stream: true,
        }
    }
}
