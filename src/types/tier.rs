use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tier a user registers with.
///
/// The backend rate-limits chat requests per tier.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Ten chat requests per minute.
    #[default]
    Free,

    /// Sixty chat requests per minute.
    Pro,

    /// Three hundred chat requests per minute.
    Enterprise,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Pro => write!(f, "pro"),
            Tier::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// Error returned when parsing an invalid tier string.
#[derive(Debug)]
pub struct TierParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for TierParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown tier: {} (expected free, pro, or enterprise)",
            self.invalid_value
        )
    }
}

impl std::error::Error for TierParseError {}

impl FromStr for Tier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "enterprise" => Ok(Tier::Enterprise),
            _ => Err(TierParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}
