use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::SessionId;

/// One of the authenticated user's conversations, as listed by
/// `GET /api/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Identifier to continue this session with.
    pub id: SessionId,

    /// Human-readable title.
    pub title: String,

    /// When the session was opened.
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,

    /// When the session last received a message.
    #[serde(with = "crate::utils::time")]
    pub updated_at: OffsetDateTime,
}

/// Response body of `GET /api/sessions`, most recently updated first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionList {
    /// The sessions.
    pub sessions: Vec<SessionSummary>,
}
