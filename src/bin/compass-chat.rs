//! Interactive chat with the CareerCompass career-advice assistant.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local backend
//! compass-chat
//!
//! # Talk to a deployed backend, registering new accounts on the pro tier
//! compass-chat --api-url https://compass.example.com --tier pro
//!
//! # Use the older history-carrying protocol
//! compass-chat --stateless --no-pending
//! ```
//!
//! The first message prompts for an email and password unless a token is
//! already stored.  Set `RUST_LOG=compass=debug` to see request logs.
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/new` - Start a new session
//! - `/sessions` - List saved sessions
//! - `/resume <id>` - Continue a saved session
//! - `/health` - Check the backend
//! - `/status` - Show local state
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use time::OffsetDateTime;
use time::macros::format_description;

use compass::chat::{
    ChatArgs, ChatCommand, ChatConfig, TerminalPrompt, TerminalView, help_text, parse_command,
};
use compass::{
    ChatView, ChatWidget, CompassClient, FileCredentialStore, SessionBootstrapper,
};

type Widget = ChatWidget<CompassClient, FileCredentialStore, TerminalPrompt, TerminalView>;

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("compass=warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

/// Main entry point for the compass-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let (args, _) = ChatArgs::from_command_line_relaxed("compass-chat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;

    let client = CompassClient::with_options(config.api_url.clone(), Some(config.timeout))?;
    let token_file = config
        .resolved_token_file()
        .ok_or("no configuration directory; pass --token-file")?;
    let store = FileCredentialStore::new(token_file);
    let prompt = TerminalPrompt::new().with_banner("Sign in to CareerCompass");
    let bootstrapper = SessionBootstrapper::with_tier(store, prompt, config.tier);
    let view = TerminalView::with_color(config.use_color);

    println!("CareerCompass ({})", client.base_url());
    println!("Type /help for commands, /quit to exit\n");

    let widget = ChatWidget::mount(client, bootstrapper, view, config.widget_options());
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::New => {
                            widget.reset_session();
                            info(&widget, "Started a new session.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Sessions => print_sessions(&widget).await,
                        ChatCommand::Resume(id) => {
                            let text = format!("Resuming session {id}.");
                            widget.resume_session(id);
                            info(&widget, &text);
                        }
                        ChatCommand::Health => print_health(&widget).await,
                        ChatCommand::Status => print_status(&widget),
                        ChatCommand::Invalid(message) => {
                            widget.with_view(|view| view.show_error_message(&message));
                        }
                    }
                    continue;
                }

                widget.submit(line).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                info(&widget, &format!("Input error: {}", err));
                break;
            }
        }
    }

    widget.teardown();
    Ok(())
}

fn info(widget: &Widget, text: &str) {
    widget.with_view(|view| view.print_info(text));
}

async fn print_sessions(widget: &Widget) {
    match widget.list_sessions().await {
        Ok(list) if list.sessions.is_empty() => info(widget, "    No saved sessions."),
        Ok(list) => {
            let current = widget.session_id();
            println!("    Sessions:");
            for session in list.sessions {
                let marker = if current.as_ref() == Some(&session.id) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "    {} {:>6}  {}  (updated {})",
                    marker,
                    session.id,
                    session.title,
                    describe_time(session.updated_at)
                );
            }
        }
        Err(err) => widget.with_view(|view| view.show_error_message(&format!("Error: {err}"))),
    }
}

async fn print_health(widget: &Widget) {
    match widget.health().await {
        Ok(health) => {
            println!("    Backend: {}", health.status);
            println!("      Environment: {}", describe(health.env.as_deref()));
            println!("      Database: {}", describe(health.db.as_deref()));
            println!("      Cache: {}", describe(health.redis.as_deref()));
            if !health.is_ready() {
                println!("      Replies are canned until the model is configured.");
            }
        }
        Err(err) => widget.with_view(|view| view.show_error_message(&format!("Error: {err}"))),
    }
}

fn print_status(widget: &Widget) {
    let stats = widget.stats();
    println!("    Session Status:");
    println!("      Backend: {}", widget.backend().base_url());
    println!("      Protocol: {:?}", stats.protocol);
    println!(
        "      Signed in: {}",
        if stats.authenticated { "yes" } else { "no" }
    );
    match stats.session_id {
        Some(ref id) => println!("      Session: {}", id),
        None => println!("      Session: (none)"),
    }
    println!("      History turns: {}", stats.history_len);
    println!("      Messages sent: {}", stats.submissions);
}

fn describe(value: Option<&str>) -> &str {
    value.unwrap_or("unknown")
}

fn describe_time(when: OffsetDateTime) -> String {
    when.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| when.to_string())
}
