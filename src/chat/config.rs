//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::types::Tier;
use crate::widget::{ChatProtocol, WidgetOptions};

/// Default transport timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Command-line arguments for the compass-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the CareerCompass API.
    #[arrrg(optional, "API base URL (default: $COMPASS_API_URL or http://localhost:5000/)", "URL")]
    pub api_url: Option<String>,

    /// Where the access token is kept between runs.
    #[arrrg(optional, "Credential storage file (default: <config dir>/careercompass/storage.json)", "PATH")]
    pub token_file: Option<String>,

    /// Tier used when registering a new account.
    #[arrrg(optional, "Tier for new accounts: free, pro, enterprise (default: free)", "TIER")]
    pub tier: Option<String>,

    /// Request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 45)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Send the full history with every message instead of a session id.
    #[arrrg(flag, "Use the stateless history protocol (no login)")]
    pub stateless: bool,

    /// Hide the pending indicator.
    #[arrrg(flag, "Do not show a pending indicator while waiting")]
    pub no_pending: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Error produced when arguments cannot be turned into a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatArgsError {
    /// What was wrong.
    pub message: String,
}

impl std::fmt::Display for ChatArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ChatArgsError {}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// API base URL; `None` defers to the environment.
    pub api_url: Option<String>,

    /// Credential storage file; `None` uses the platform default.
    pub token_file: Option<PathBuf>,

    /// Tier for new registrations.
    pub tier: Tier,

    /// Transport timeout.
    pub timeout: Duration,

    /// Context protocol.
    pub protocol: ChatProtocol,

    /// Whether to show the pending indicator.
    pub pending_indicator: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - API URL: from the environment
    /// - Tier: free
    /// - Timeout: 45 seconds
    /// - Protocol: session
    /// - Pending indicator and color: enabled
    pub fn new() -> Self {
        Self {
            api_url: None,
            token_file: None,
            tier: Tier::Free,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            protocol: ChatProtocol::Session,
            pending_indicator: true,
            use_color: true,
        }
    }

    /// Sets the API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the credential storage file.
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Sets the registration tier.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the context protocol.
    pub fn with_protocol(mut self, protocol: ChatProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Hides the pending indicator.
    pub fn without_pending_indicator(mut self) -> Self {
        self.pending_indicator = false;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The credential file to use, if one can be determined.
    pub fn resolved_token_file(&self) -> Option<PathBuf> {
        self.token_file
            .clone()
            .or_else(crate::credential::FileCredentialStore::default_path)
    }

    /// Widget options implied by this configuration.
    pub fn widget_options(&self) -> WidgetOptions {
        WidgetOptions::new()
            .with_protocol(self.protocol)
            .with_pending_indicator(self.pending_indicator)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = ChatArgsError;

    fn try_from(args: ChatArgs) -> Result<Self, Self::Error> {
        let tier = match args.tier {
            Some(tier) => tier.parse::<Tier>().map_err(|err| ChatArgsError {
                message: err.to_string(),
            })?,
            None => Tier::Free,
        };
        if args.timeout == Some(0) {
            return Err(ChatArgsError {
                message: "--timeout must be at least one second".to_string(),
            });
        }
        Ok(ChatConfig {
            api_url: args.api_url,
            token_file: args.token_file.map(PathBuf::from),
            tier,
            timeout: Duration::from_secs(args.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            protocol: if args.stateless {
                ChatProtocol::Stateless
            } else {
                ChatProtocol::Session
            },
            pending_indicator: !args.no_pending,
            use_color: !args.no_color,
        })
    }
}
