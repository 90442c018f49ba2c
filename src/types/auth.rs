use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Tier;

/// Body of `POST /api/auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginParams {
    /// Account identifier.
    pub email: String,

    /// Account secret.
    pub password: String,
}

impl LoginParams {
    /// Create login parameters.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Extend these parameters into a registration request for `tier`.
    pub fn into_register(self, tier: Tier) -> RegisterParams {
        RegisterParams {
            email: self.email,
            password: self.password,
            tier,
        }
    }
}

// Passwords stay out of logs.
impl fmt::Debug for LoginParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginParams")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterParams {
    /// Account identifier.
    pub email: String,

    /// Account secret.
    pub password: String,

    /// Tier to register with.
    pub tier: Tier,
}

impl fmt::Debug for RegisterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterParams")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("tier", &self.tier)
            .finish()
    }
}

/// Response to a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,

    /// The authenticated user's id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    /// The authenticated user's tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
}
