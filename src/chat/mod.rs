//! Chat application module for interactive conversations with GLM.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! glaucus client library. It supports:
//!
//! - Streaming responses with a typewriter cursor
//! - Transcript replay as role-tagged blocks
//! - Credential resolution from the environment or a masked prompt
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`credential`]: API key resolution
//! - [`session`]: Transcript ownership and API interaction
//! - [`stream`]: Assembly of streamed fragments into a reply
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
mod credential;
mod render;
mod session;
mod stream;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use credential::{Credential, CredentialSource, resolve};
pub use render::{CURSOR, PlainTextRenderer, Renderer};
pub use session::ChatSession;
pub use stream::assemble;
