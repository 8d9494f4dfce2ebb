//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration for a chat session. The model identifier is a fixed
//! constant in this version, not a runtime option.

use arrrg_derive::CommandLine;

use crate::types::{KnownModel, Model};

/// The model every completion request is sent to.
const DEFAULT_MODEL: KnownModel = KnownModel::Glm4;

/// Command-line arguments for the glaucus-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Override the API base URL (testing against a proxy or mock).
    #[arrrg(optional, "Override the API base URL", "URL")]
    pub base_url: Option<String>,
}

/// Configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Override for the API base URL, if any.
    pub base_url: Option<String>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: glm-4
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::Known(DEFAULT_MODEL),
            use_color: true,
            base_url: None,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the base URL override.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            model: Model::Known(DEFAULT_MODEL),
            use_color: !args.no_color,
            base_url: args.base_url,
        }
    }
}
