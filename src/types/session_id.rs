use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Backend-issued handle that correlates chat turns into one conversation.
///
/// The identifier is opaque to the client.  Whatever JSON form the backend
/// used (it issues integers today) is preserved and echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionId {
    /// A numeric identifier.
    Numeric(u64),

    /// Any other identifier.
    Opaque(String),
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Numeric(id) => write!(f, "{id}"),
            SessionId::Opaque(id) => write!(f, "{id}"),
        }
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        SessionId::Numeric(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        SessionId::Opaque(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        SessionId::Opaque(id)
    }
}

/// Parses user input such as a `/resume` argument.
///
/// Decimal digits become [`SessionId::Numeric`]; anything else is opaque.
impl FromStr for SessionId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<u64>() {
            Ok(id) => SessionId::Numeric(id),
            Err(_) => SessionId::Opaque(s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_json_form() {
        let numeric: SessionId = serde_json::from_str("42").unwrap();
        assert_eq!(numeric, SessionId::Numeric(42));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "42");

        let opaque: SessionId = serde_json::from_str(r#""abc123""#).unwrap();
        assert_eq!(opaque, SessionId::from("abc123"));
        assert_eq!(serde_json::to_string(&opaque).unwrap(), r#""abc123""#);
    }

    #[test]
    fn display() {
        assert_eq!(SessionId::from(7).to_string(), "7");
        assert_eq!(SessionId::from("abc123").to_string(), "abc123");
    }

    #[test]
    fn parse_from_user_input() {
        assert_eq!(" 4 ".parse::<SessionId>(), Ok(SessionId::Numeric(4)));
        assert_eq!("abc123".parse::<SessionId>(), Ok(SessionId::from("abc123")));
        assert_eq!("-4".parse::<SessionId>(), Ok(SessionId::from("-4")));
    }
}
