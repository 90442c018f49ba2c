//! Session bootstrap: obtaining and persisting the access credential.
//!
//! A credential is looked up in memory, then in durable storage.  Only when
//! both are empty is the user prompted; the answer is tried as a login and,
//! failing that, as a registration with the configured tier.  The first
//! token issued is kept in memory and written to storage.

use std::sync::{Mutex, MutexGuard};

use crate::client::Backend;
use crate::credential::CredentialStore;
use crate::error::{Error, Result};
use crate::observability::{AUTH_FAILURES, AUTH_LOGINS, AUTH_REGISTRATIONS};
use crate::prompt::CredentialPrompt;
use crate::types::{LoginParams, Tier};

/// Ensures an access credential exists before authenticated requests.
pub struct SessionBootstrapper<S: CredentialStore, P: CredentialPrompt> {
    store: S,
    prompt: P,
    tier: Tier,
    credential: Mutex<Option<String>>,
    // Serializes prompting so overlapping submissions authenticate once.
    gate: tokio::sync::Mutex<()>,
}

impl<S: CredentialStore, P: CredentialPrompt> SessionBootstrapper<S, P> {
    /// Creates a bootstrapper that registers new accounts on the free tier.
    pub fn new(store: S, prompt: P) -> Self {
        Self::with_tier(store, prompt, Tier::default())
    }

    /// Creates a bootstrapper that registers new accounts on `tier`.
    pub fn with_tier(store: S, prompt: P, tier: Tier) -> Self {
        Self {
            store,
            prompt,
            tier,
            credential: Mutex::new(None),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// The tier used for registration.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// The durable store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The credential prompt.
    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// The credential currently held in memory.
    pub fn credential(&self) -> Option<String> {
        self.slot().clone()
    }

    /// Loads the credential from durable storage into memory.
    ///
    /// Returns whether a credential is now held.
    pub fn restore(&self) -> Result<bool> {
        let stored = self.store.load()?;
        let mut slot = self.slot();
        if slot.is_none() {
            *slot = stored;
        }
        Ok(slot.is_some())
    }

    /// Returns the credential, authenticating first if none is known.
    ///
    /// Concurrent callers that all lack a credential wait for the first
    /// one's attempt and then share its result rather than prompting again.
    pub async fn ensure_credential<B: Backend + ?Sized>(&self, backend: &B) -> Result<String> {
        if let Some(token) = self.credential() {
            return Ok(token);
        }
        let _gate = self.gate.lock().await;
        if let Some(token) = self.credential() {
            return Ok(token);
        }
        match self.store.load() {
            Ok(Some(token)) => {
                tracing::debug!("picked up credential written to storage externally");
                *self.slot() = Some(token.clone());
                return Ok(token);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "could not read credential storage");
            }
        }
        self.authenticate(backend).await
    }

    /// Prompts for credentials and performs the login-then-register sequence.
    ///
    /// Exactly one prompt and at most two requests are made.  Any failure
    /// of the login request, whatever its cause, falls through to
    /// registration.
    pub async fn authenticate<B: Backend + ?Sized>(&self, backend: &B) -> Result<String> {
        let params = self.prompt.request_credentials().await?;
        let params = validate(params)?;

        let token = match backend.login(&params).await {
            Ok(response) => {
                AUTH_LOGINS.click();
                tracing::info!(email = %params.email, "logged in");
                response.access_token
            }
            Err(login_err) => {
                tracing::debug!(
                    email = %params.email,
                    error = %login_err,
                    "login failed; registering"
                );
                let register = params.into_register(self.tier);
                match backend.register(&register).await {
                    Ok(response) => {
                        AUTH_REGISTRATIONS.click();
                        tracing::info!(email = %register.email, tier = %self.tier, "registered");
                        response.access_token
                    }
                    Err(register_err) => {
                        AUTH_FAILURES.click();
                        tracing::warn!(
                            email = %register.email,
                            login_error = %login_err,
                            register_error = %register_err,
                            "unable to authenticate"
                        );
                        return Err(Error::unable_to_authenticate(format!(
                            "login: {login_err}; register: {register_err}"
                        )));
                    }
                }
            }
        };

        *self.slot() = Some(token.clone());
        if let Err(err) = self.store.store(&token) {
            // The credential still serves this widget; it just won't survive a restart.
            tracing::warn!(error = %err, "could not persist credential");
        }
        Ok(token)
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.credential
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn validate(params: Option<LoginParams>) -> Result<LoginParams> {
    let Some(params) = params else {
        return Err(Error::authentication_required(
            "email and password are required",
        ));
    };
    let email = params.email.trim();
    if email.is_empty() {
        return Err(Error::authentication_required("email is required"));
    }
    if params.password.is_empty() {
        return Err(Error::authentication_required("password is required"));
    }
    Ok(LoginParams::new(email, params.password))
}
