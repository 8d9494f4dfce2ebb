//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the
//! conversation transcript and drives streaming API interactions.

use futures::Stream;

use crate::chat::config::ChatConfig;
use crate::chat::render::Renderer;
use crate::chat::stream::assemble;
use crate::client::{API_KEY_ENV, Zhipu};
use crate::error::{Error, Result};
use crate::types::{ChatCompletionChunk, ChatCompletionParams, ChatMessage, Model};

/// A chat session that owns the transcript and handles API interactions.
///
/// The transcript is append-only and lives exactly as long as the process;
/// every request carries the whole of it, with no cap on its growth (an
/// accepted limitation). A session without a client holds user turns but
/// refuses to send until the process is restarted with a key.
pub struct ChatSession {
    client: Option<Zhipu>,
    config: ChatConfig,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Creates a new chat session.
    ///
    /// `client` is `None` when no credential could be resolved; the session
    /// still accepts input so typed turns are kept for a later retry.
    pub fn new(client: Option<Zhipu>, config: ChatConfig) -> Self {
        Self {
            client,
            config,
            messages: Vec::new(),
        }
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Appends the user message to the transcript
    /// 2. Sends a streaming request carrying the full transcript
    /// 3. Renders response fragments as they arrive
    /// 4. Appends the complete assistant response to the transcript
    ///
    /// # Errors
    ///
    /// Returns an error if no credential is configured or the API request
    /// fails. The user message stays in the transcript either way; only a
    /// successfully completed reply is committed as an assistant message.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        self.messages.push(ChatMessage::user(user_input));

        let Some(client) = self.client.clone() else {
            return Err(Error::authentication(format!(
                "no API key configured; set {API_KEY_ENV} (or enter a key at startup) to chat"
            )));
        };

        let params =
            ChatCompletionParams::new_streaming(self.config.model.clone(), self.messages.clone());
        let stream = client.stream(params).await?;
        self.finish_turn(stream, renderer).await
    }

    /// Assembles a reply stream and commits it to the transcript.
    ///
    /// On error the partial reply is discarded and nothing is committed.
    async fn finish_turn<S>(&mut self, stream: S, renderer: &mut dyn Renderer) -> Result<()>
    where
        S: Stream<Item = Result<ChatCompletionChunk>>,
    {
        let reply = assemble(stream, renderer).await?;
        self.messages.push(ChatMessage::assistant(reply));
        Ok(())
    }

    /// Returns the transcript so far, oldest message first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns the model completions are requested from.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// Returns true if a credential was resolved for this session.
    pub fn has_credential(&self) -> bool {
        self.client.is_some()
    }
}
