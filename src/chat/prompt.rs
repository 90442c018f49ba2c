//! Interactive credential prompt for the terminal.

use dialoguer::{Input, Password};

use crate::error::{Error, Result};
use crate::prompt::CredentialPrompt;
use crate::types::LoginParams;

/// Asks for an email and password on the controlling terminal.
///
/// An empty email is treated as a dismissal.  The blocking terminal
/// interaction runs on tokio's blocking pool.
#[derive(Debug, Default, Clone)]
pub struct TerminalPrompt {
    banner: Option<String>,
}

impl TerminalPrompt {
    /// Creates a prompt with no banner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints `banner` before asking.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }
}

#[async_trait::async_trait]
impl CredentialPrompt for TerminalPrompt {
    async fn request_credentials(&self) -> Result<Option<LoginParams>> {
        let banner = self.banner.clone();
        tokio::task::spawn_blocking(move || ask(banner.as_deref()))
            .await
            .map_err(|err| Error::io("credential prompt failed", std::io::Error::other(err)))?
    }
}

fn ask(banner: Option<&str>) -> Result<Option<LoginParams>> {
    if let Some(banner) = banner {
        eprintln!("{banner}");
    }
    let email: String = Input::new()
        .with_prompt("Email")
        .allow_empty(true)
        .interact_text()
        .map_err(dialog_error)?;
    if email.trim().is_empty() {
        return Ok(None);
    }
    let password = Password::new()
        .with_prompt("Password")
        .allow_empty_password(true)
        .interact()
        .map_err(dialog_error)?;
    Ok(Some(LoginParams::new(email, password)))
}

fn dialog_error(err: dialoguer::Error) -> Error {
    Error::io("could not read credentials", std::io::Error::other(err))
}
