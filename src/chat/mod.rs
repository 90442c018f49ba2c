//! Terminal front end for the CareerCompass chat widget.
//!
//! This module supplies the pieces the `compass-chat` binary wires around a
//! [`ChatWidget`](crate::widget::ChatWidget):
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing
//! - [`render`]: ANSI terminal view of the conversation
//! - [`prompt`]: Email/password prompt on the terminal

mod commands;
mod config;
mod prompt;
mod render;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatArgsError, ChatConfig};
pub use prompt::TerminalPrompt;
pub use render::TerminalView;
