//! API key resolution for the chat application.
//!
//! The key is looked up in the host environment first and requested
//! interactively (masked) only when that fails. No validation happens
//! here; a bad key surfaces as an authentication error on the first
//! request.

use std::env;
use std::fmt;
use std::io;

use dialoguer::Password;

use crate::chat::render::Renderer;
use crate::client::API_KEY_ENV;
use crate::error::{Error, Result};

/// Where a resolved credential came from. Informational only; the two
/// sources behave identically afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Found in the host-provided secret source (the environment).
    Store,

    /// Typed at the interactive masked prompt.
    Manual,
}

/// An opaque API key, held in memory for the life of the process.
#[derive(Clone)]
pub struct Credential {
    value: String,
    source: CredentialSource,
}

impl Credential {
    /// The secret itself.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Which path produced this credential.
    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolves an API key, preferring the secret source over the prompt.
///
/// Returns `Ok(None)` when neither path yields a key; that is a normal
/// condition, not an error, and the session starts without a client.
pub fn resolve(renderer: &mut dyn Renderer) -> Result<Option<Credential>> {
    let stored = env::var(API_KEY_ENV).ok().filter(|value| !value.is_empty());
    resolve_from(stored, prompt_for_key, renderer)
}

fn resolve_from<F>(
    stored: Option<String>,
    prompt: F,
    renderer: &mut dyn Renderer,
) -> Result<Option<Credential>>
where
    F: FnOnce() -> Result<String>,
{
    if let Some(value) = stored {
        renderer.print_info(&format!("API key loaded from {API_KEY_ENV}."));
        return Ok(Some(Credential {
            value,
            source: CredentialSource::Store,
        }));
    }

    renderer.print_info(&format!(
        "{API_KEY_ENV} is not set; enter a key below, or restart with it configured."
    ));
    let value = prompt()?;
    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Credential {
            value,
            source: CredentialSource::Manual,
        }))
    }
}

fn prompt_for_key() -> Result<String> {
    Password::new()
        .with_prompt("ZhipuAI API key (leave empty to skip)")
        .allow_empty_password(true)
        .interact()
        .map_err(|err| {
            Error::io(
                "failed to read API key",
                io::Error::new(io::ErrorKind::Other, err),
            )
        })
}
