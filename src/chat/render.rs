//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction so the session
//! can be exercised against a recording renderer in tests while the binary
//! writes to a terminal.

use std::io::{self, Stdout, Write};

use crate::types::{ChatMessage, Role};

/// ANSI escape code for bold text (used for role labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the assistant label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// The marker appended to an in-progress reply, purely for display.
pub const CURSOR: &str = "▌";

/// Trait for rendering chat output.
///
/// The stream assembler calls `render_partial` after every fragment with
/// the full accumulated buffer plus the trailing cursor marker, and
/// `render_final` once with the finished text.
pub trait Renderer: Send {
    /// Render the in-progress reply buffer, cursor marker included.
    fn render_partial(&mut self, text: &str);

    /// Render the completed reply, replacing any partial display.
    fn render_final(&mut self, text: &str);

    /// Render the full transcript as role-tagged blocks, oldest first.
    fn print_transcript(&mut self, messages: &[ChatMessage]);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// Each `render_partial` call receives the whole buffer, but only the new
/// suffix is written; the cursor marker is erased and redrawn so streaming
/// reads as a typewriter effect.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    printed: usize,
    cursor_shown: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            printed: 0,
            cursor_shown: false,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn erase_cursor(&mut self) {
        if self.cursor_shown {
            // Back over the single-column cursor glyph.
            print!("\u{8} \u{8}");
            self.cursor_shown = false;
        }
    }

    fn role_label(&self, role: Role) -> String {
        let (label, color) = match role {
            Role::User => ("You", ANSI_CYAN),
            Role::Assistant => ("GLM", ANSI_GREEN),
        };
        if self.use_color {
            format!("{ANSI_BOLD}{color}{label}:{ANSI_RESET}")
        } else {
            format!("{label}:")
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn render_partial(&mut self, text: &str) {
        let body = text.strip_suffix(CURSOR).unwrap_or(text);
        self.erase_cursor();
        if let Some(suffix) = body.get(self.printed..) {
            print!("{suffix}");
        } else {
            // Buffer no longer extends what was printed; redraw it whole.
            println!();
            print!("{body}");
        }
        print!("{CURSOR}");
        self.cursor_shown = true;
        self.printed = body.len();
        self.flush();
    }

    fn render_final(&mut self, text: &str) {
        self.erase_cursor();
        if let Some(suffix) = text.get(self.printed..) {
            print!("{suffix}");
        } else {
            println!();
            print!("{text}");
        }
        println!();
        self.printed = 0;
        self.flush();
    }

    fn print_transcript(&mut self, messages: &[ChatMessage]) {
        for message in messages {
            println!("{}", self.role_label(message.role));
            println!("{}", message.content);
            println!();
        }
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.erase_cursor();
        self.printed = 0;
        eprintln!("\nError: {error}");
    }
}

/// Records every rendering call, for assertions in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    pub(crate) partials: Vec<String>,
    pub(crate) finals: Vec<String>,
    pub(crate) transcripts: Vec<Vec<ChatMessage>>,
    pub(crate) infos: Vec<String>,
    pub(crate) errors: Vec<String>,
}

#[cfg(test)]
impl Renderer for RecordingRenderer {
    fn render_partial(&mut self, text: &str) {
        self.partials.push(text.to_string());
    }

    fn render_final(&mut self, text: &str) {
        self.finals.push(text.to_string());
    }

    fn print_transcript(&mut self, messages: &[ChatMessage]) {
        self.transcripts.push(messages.to_vec());
    }

    fn print_info(&mut self, info: &str) {
        self.infos.push(info.to_string());
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }
}
