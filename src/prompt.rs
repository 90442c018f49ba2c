//! Asynchronous credential input.
//!
//! The bootstrapper never blocks on a modal dialog.  It asks a
//! [`CredentialPrompt`] for an email/password pair and awaits the answer.
//! [`FormPrompt`] is the general implementation: every request becomes a
//! [`PendingForm`] on the paired [`FormHandle`], and the request resolves
//! when that form is submitted or dismissed.

use tokio::sync::{mpsc, oneshot};

use crate::error::Result;
use crate::types::LoginParams;

/// Source of login credentials.
#[async_trait::async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// Ask the user for an email and password.
    ///
    /// `Ok(None)` means the user dismissed the prompt.  Values are returned
    /// as entered; the caller decides whether they are acceptable.
    async fn request_credentials(&self) -> Result<Option<LoginParams>>;
}

/// A credential prompt resolved by form submissions on a [`FormHandle`].
#[derive(Debug, Clone)]
pub struct FormPrompt {
    requests: mpsc::UnboundedSender<PendingForm>,
}

/// The form side of a [`FormPrompt`].
#[derive(Debug)]
pub struct FormHandle {
    requests: mpsc::UnboundedReceiver<PendingForm>,
}

/// One outstanding credential request.
///
/// Dropping it without submitting counts as a dismissal.
#[derive(Debug)]
pub struct PendingForm {
    reply: oneshot::Sender<Option<LoginParams>>,
}

impl FormPrompt {
    /// Creates a prompt and the handle that answers it.
    pub fn new() -> (Self, FormHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { requests: tx }, FormHandle { requests: rx })
    }
}

impl FormHandle {
    /// Waits for the next credential request.
    ///
    /// Returns `None` once every [`FormPrompt`] clone has been dropped.
    pub async fn next_request(&mut self) -> Option<PendingForm> {
        self.requests.recv().await
    }

    /// Returns a request if one is already waiting.
    pub fn try_next_request(&mut self) -> Option<PendingForm> {
        self.requests.try_recv().ok()
    }
}

impl PendingForm {
    /// Submits the form.
    pub fn submit(self, email: impl Into<String>, password: impl Into<String>) {
        let _ = self.reply.send(Some(LoginParams::new(email, password)));
    }

    /// Closes the form without answering.
    pub fn dismiss(self) {
        let _ = self.reply.send(None);
    }
}

#[async_trait::async_trait]
impl CredentialPrompt for FormPrompt {
    async fn request_credentials(&self) -> Result<Option<LoginParams>> {
        let (tx, rx) = oneshot::channel();
        if self.requests.send(PendingForm { reply: tx }).is_err() {
            tracing::debug!("credential form is gone; treating request as dismissed");
            return Ok(None);
        }
        Ok(rx.await.unwrap_or(None))
    }
}
