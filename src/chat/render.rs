//! Terminal rendering for the chat application.
//!
//! [`TerminalView`] implements [`ChatView`] on top of any writer, using ANSI
//! escape codes to tell the user's lines, the assistant's lines and errors
//! apart.  Without color it falls back to plain labels, which suits piping.

use std::io::{self, Stdout, Write};

use crate::view::{ChatView, PendingId};

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the pending indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for assistant replies).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Returns the cursor to column zero and erases the line.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Label printed before assistant messages.
const BOT_LABEL: &str = "Compass:";

/// Text of the pending indicator.
const PENDING_TEXT: &str = "thinking...";

/// A [`ChatView`] that writes the conversation to a terminal.
///
/// The user's own lines are already echoed by the line editor, so
/// `show_user_message` prints nothing.  A pending indicator is left without
/// a trailing newline so that, with color enabled, the reply can overwrite
/// it in place.
pub struct TerminalView<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    open_pending: Option<PendingId>,
}

impl TerminalView<Stdout> {
    /// Creates a view on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a view on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for TerminalView<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> TerminalView<W> {
    /// Creates a view on an arbitrary writer.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            open_pending: None,
        }
    }

    /// Whether ANSI styling is used.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Consumes the view, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    // Output errors are ignored: there is nowhere better to report them.
    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    /// Ends a dangling pending line so the next output starts cleanly.
    fn close_pending(&mut self) {
        if self.open_pending.take().is_some() {
            self.emit("\n");
        }
    }

    /// Prepares to replace the indicator `id`.
    ///
    /// When the indicator is still the last thing on screen it is erased;
    /// otherwise the replacement is printed on a fresh line.
    fn take_pending(&mut self, id: PendingId) {
        if self.open_pending == Some(id) {
            self.open_pending = None;
            if self.use_color {
                self.emit(ANSI_CLEAR_LINE);
            } else {
                self.emit("\n");
            }
        } else {
            self.close_pending();
        }
    }

    fn bot_line(&mut self, text: &str) {
        let line = if self.use_color {
            format!("{ANSI_BOLD}{ANSI_CYAN}{BOT_LABEL}{ANSI_RESET} {text}\n")
        } else {
            format!("{BOT_LABEL} {text}\n")
        };
        self.emit(&line);
    }

    fn error_line(&mut self, text: &str) {
        let line = if self.use_color {
            format!("{ANSI_BOLD}{ANSI_RED}{BOT_LABEL}{ANSI_RESET} {ANSI_RED}{text}{ANSI_RESET}\n")
        } else {
            format!("{BOT_LABEL} {text}\n")
        };
        self.emit(&line);
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn show_user_message(&mut self, _: &str) {
        self.close_pending();
    }

    fn show_bot_message(&mut self, text: &str) {
        self.close_pending();
        self.bot_line(text);
    }

    fn show_error_message(&mut self, text: &str) {
        self.close_pending();
        self.error_line(text);
    }

    fn show_pending(&mut self, id: PendingId) {
        self.close_pending();
        let line = if self.use_color {
            format!("{ANSI_BOLD}{ANSI_CYAN}{BOT_LABEL}{ANSI_RESET} {ANSI_DIM}{PENDING_TEXT}{ANSI_RESET}")
        } else {
            format!("{BOT_LABEL} {PENDING_TEXT}")
        };
        self.emit(&line);
        self.open_pending = Some(id);
    }

    fn resolve_pending(&mut self, id: PendingId, reply: &str) {
        self.take_pending(id);
        self.bot_line(reply);
    }

    fn fail_pending(&mut self, id: PendingId, error: &str) {
        self.take_pending(id);
        self.error_line(error);
    }

    fn print_info(&mut self, info: &str) {
        self.close_pending();
        self.emit(&format!("{info}\n"));
    }

    fn interrupt_pending(&mut self) {
        self.close_pending();
    }
}
