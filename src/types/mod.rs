//! Wire types for the ZhipuAI chat-completion API.

mod chat_completion_chunk;
mod chat_completion_params;
mod chat_message;
mod model;

pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, MessageDelta};
pub use chat_completion_params::ChatCompletionParams;
pub use chat_message::{ChatMessage, Role};
pub use model::{KnownModel, Model};
