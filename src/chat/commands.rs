//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the client and is never sent to the
//! backend as a chat message.

use crate::types::SessionId;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Forget the current session; the next message opens a new one.
    New,

    /// List the user's sessions on the backend.
    Sessions,

    /// Continue one of the user's sessions.
    Resume(SessionId),

    /// Check backend health.
    Health,

    /// Show local widget state.
    Status,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use compass::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("I want to become a backend engineer").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" | "reset" => no_argument(ChatCommand::New, "/new", argument),
        "sessions" => no_argument(ChatCommand::Sessions, "/sessions", argument),
        "resume" => match argument.and_then(|id| id.parse::<SessionId>().ok()) {
            Some(id) => ChatCommand::Resume(id),
            None => ChatCommand::Invalid("/resume requires a session id".to_string()),
        },
        "health" => no_argument(ChatCommand::Health, "/health", argument),
        "status" | "stats" => no_argument(ChatCommand::Status, "/status", argument),
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn no_argument(command: ChatCommand, name: &str, argument: Option<&str>) -> ChatCommand {
    match argument {
        None => command,
        Some(_) => ChatCommand::Invalid(format!("{name} takes no arguments")),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new career session
  /sessions              List your saved sessions
  /resume <id>           Continue a saved session
  /health                Check the backend status
  /status                Show local session state
  /help                  Show this help message
  /quit                  Exit the chat"#
}
