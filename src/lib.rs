//! Client library for the CareerCompass career-advice chat API.
//!
//! The pieces fit together as follows:
//!
//! - [`CompassClient`] speaks HTTP to the backend through the [`Backend`] trait.
//! - [`SessionBootstrapper`] obtains an access credential (login, falling back
//!   to registration) and keeps it in a [`CredentialStore`].
//! - [`ChatWidget`] is the controller for one chat pane: it renders through a
//!   [`ChatView`], tracks the backend session id, and turns every failure into
//!   an in-conversation error message.
//!
//! The `compass-chat` binary wires these to a terminal using [`chat`].

// Public modules
pub mod auth;
pub mod chat;
pub mod client;
pub mod credential;
pub mod error;
pub mod observability;
pub mod prompt;
pub mod types;
pub mod utils;
pub mod view;
pub mod widget;

// Re-exports
pub use auth::SessionBootstrapper;
pub use client::{Backend, CompassClient};
pub use credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use prompt::{CredentialPrompt, FormHandle, FormPrompt, PendingForm};
pub use types::*;
pub use view::{ChatView, MessageList, MessageRole, PendingId, RenderedMessage};
pub use widget::{
    ChatProtocol, ChatWidget, SubmissionOutcome, SubmissionPhase, WidgetOptions, WidgetStats,
};
