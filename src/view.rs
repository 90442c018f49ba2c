//! The rendering seam between the chat widget and whatever displays it.
//!
//! The widget only ever appends messages and swaps a provisional indicator
//! for its outcome; [`ChatView`] is exactly that vocabulary.  [`MessageList`]
//! keeps the rendered conversation as data, which is what an embedding UI
//! and the tests want.

/// Identifies one provisional "pending" indicator.
///
/// The widget uses the submission's sequence number, so overlapping
/// submissions each resolve their own indicator.
pub type PendingId = u64;

/// Trait for rendering the conversation.
pub trait ChatView: Send {
    /// Append a message typed by the user.
    fn show_user_message(&mut self, text: &str);

    /// Append a message from the assistant.
    fn show_bot_message(&mut self, text: &str);

    /// Append an error message in the assistant's column.
    fn show_error_message(&mut self, text: &str);

    /// Append a provisional indicator while a reply is outstanding.
    fn show_pending(&mut self, id: PendingId);

    /// Replace the indicator `id` with the assistant's reply.
    fn resolve_pending(&mut self, id: PendingId, reply: &str);

    /// Replace the indicator `id` with an error message.
    fn fail_pending(&mut self, id: PendingId, error: &str);

    /// Print an informational line that is not part of the conversation.
    fn print_info(&mut self, info: &str);

    /// Something outside the view, such as a credential prompt, is about to
    /// use the screen while indicators are outstanding.
    fn interrupt_pending(&mut self) {}
}

/// Who a rendered message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// Typed by the user.
    User,
    /// Replied by the assistant.
    Bot,
    /// Provisional indicator awaiting a reply.
    Pending,
    /// A failure shown in place of a reply.
    Error,
}

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Whose message this is.
    pub role: MessageRole,
    /// The displayed text.
    pub text: String,
    /// Set while this entry is a pending indicator.
    pub pending_id: Option<PendingId>,
}

/// A [`ChatView`] that records the conversation as an ordered list.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    messages: Vec<RenderedMessage>,
    info: Vec<String>,
}

/// Text shown by [`MessageList`] for a pending indicator.
pub const PENDING_TEXT: &str = "...";

impl MessageList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in display order.
    pub fn messages(&self) -> &[RenderedMessage] {
        &self.messages
    }

    /// Messages with the given role, in display order.
    pub fn with_role(&self, role: MessageRole) -> Vec<&RenderedMessage> {
        self.messages.iter().filter(|m| m.role == role).collect()
    }

    /// Informational lines printed so far.
    pub fn info(&self) -> &[String] {
        &self.info
    }

    fn push(&mut self, role: MessageRole, text: &str, pending_id: Option<PendingId>) {
        self.messages.push(RenderedMessage {
            role,
            text: text.to_string(),
            pending_id,
        });
    }

    fn replace_pending(&mut self, id: PendingId, role: MessageRole, text: &str) {
        match self
            .messages
            .iter_mut()
            .find(|m| m.pending_id == Some(id))
        {
            Some(message) => {
                message.role = role;
                message.text = text.to_string();
                message.pending_id = None;
            }
            None => self.push(role, text, None),
        }
    }
}

impl ChatView for MessageList {
    fn show_user_message(&mut self, text: &str) {
        self.push(MessageRole::User, text, None);
    }

    fn show_bot_message(&mut self, text: &str) {
        self.push(MessageRole::Bot, text, None);
    }

    fn show_error_message(&mut self, text: &str) {
        self.push(MessageRole::Error, text, None);
    }

    fn show_pending(&mut self, id: PendingId) {
        self.push(MessageRole::Pending, PENDING_TEXT, Some(id));
    }

    fn resolve_pending(&mut self, id: PendingId, reply: &str) {
        self.replace_pending(id, MessageRole::Bot, reply);
    }

    fn fail_pending(&mut self, id: PendingId, error: &str) {
        self.replace_pending(id, MessageRole::Error, error);
    }

    fn print_info(&mut self, info: &str) {
        self.info.push(info.to_string());
    }
}
