// Public modules
pub mod auth;
pub mod chat;
pub mod health;
pub mod session_id;
pub mod session_summary;
pub mod tier;

// Re-exports
pub use auth::{AuthResponse, LoginParams, RegisterParams};
pub use chat::{ChatParams, ChatReply, ConversationTurn, StatelessChatParams};
pub use health::HealthStatus;
pub use session_id::SessionId;
pub use session_summary::{SessionList, SessionSummary};
pub use tier::{Tier, TierParseError};
