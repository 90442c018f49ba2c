use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{
    AuthResponse, ChatParams, ChatReply, HealthStatus, LoginParams, RegisterParams, SessionList,
    StatelessChatParams,
};

/// Base URL used when neither an explicit URL nor `COMPASS_API_URL` is given.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/";
/// Environment variable consulted for the base URL.
pub const API_URL_ENV: &str = "COMPASS_API_URL";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

const LOGIN_PATH: &str = "api/auth/login";
const REGISTER_PATH: &str = "api/auth/register";
const CHAT_PATH: &str = "api/chat";
const SESSIONS_PATH: &str = "api/sessions";
const HEALTH_PATH: &str = "health";

/// The backend operations the chat widget depends on.
///
/// [`CompassClient`] talks HTTP; tests substitute in-memory fakes.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Exchange an email/password pair for a bearer token.
    async fn login(&self, params: &LoginParams) -> Result<AuthResponse>;

    /// Create an account and return its bearer token.
    async fn register(&self, params: &RegisterParams) -> Result<AuthResponse>;

    /// Send one message within a session, authenticated by `token`.
    async fn chat(&self, token: &str, params: &ChatParams) -> Result<ChatReply>;

    /// Send one message together with the full prior history.
    async fn chat_stateless(&self, params: &StatelessChatParams) -> Result<ChatReply>;

    /// List the sessions owned by the bearer of `token`.
    async fn list_sessions(&self, token: &str) -> Result<SessionList>;

    /// Check backend health.
    async fn health(&self) -> Result<HealthStatus>;
}

/// HTTP client for the CareerCompass API.
#[derive(Debug, Clone)]
pub struct CompassClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl CompassClient {
    /// Create a new client.
    ///
    /// The base URL is read from the COMPASS_API_URL environment variable,
    /// falling back to a local development server.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let base_url = normalize_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The transport timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn bearer(builder: RequestBuilder, token: &str) -> Result<RequestBuilder> {
        let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            Error::authentication("stored access token is not a valid header value")
        })?;
        Ok(builder.header(header::AUTHORIZATION, value))
    }

    /// Send a prepared request and decode its JSON body.
    async fn execute<T: DeserializeOwned>(&self, path: &str, builder: RequestBuilder) -> Result<T> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.execute_inner(builder).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(_) => {
                tracing::debug!(
                    endpoint = path,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "request succeeded"
                );
            }
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                tracing::debug!(endpoint = path, error = %err, "request failed");
            }
        }
        result
    }

    async fn execute_inner<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .headers(Self::default_headers())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Process API response errors and convert to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };
        let error_message = error_message(status_code, &error_body);

        match status_code {
            400 => Error::bad_request(error_message),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            409 => Error::conflict(error_message),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message),
            _ => Error::api(status_code, error_message),
        }
    }
}

#[async_trait::async_trait]
impl Backend for CompassClient {
    async fn login(&self, params: &LoginParams) -> Result<AuthResponse> {
        let url = self.endpoint(LOGIN_PATH)?;
        self.execute(LOGIN_PATH, self.client.post(url).json(params))
            .await
    }

    async fn register(&self, params: &RegisterParams) -> Result<AuthResponse> {
        let url = self.endpoint(REGISTER_PATH)?;
        self.execute(REGISTER_PATH, self.client.post(url).json(params))
            .await
    }

    async fn chat(&self, token: &str, params: &ChatParams) -> Result<ChatReply> {
        let url = self.endpoint(CHAT_PATH)?;
        let builder = Self::bearer(self.client.post(url).json(params), token)?;
        self.execute(CHAT_PATH, builder).await
    }

    async fn chat_stateless(&self, params: &StatelessChatParams) -> Result<ChatReply> {
        let url = self.endpoint(CHAT_PATH)?;
        self.execute(CHAT_PATH, self.client.post(url).json(params))
            .await
    }

    async fn list_sessions(&self, token: &str) -> Result<SessionList> {
        let url = self.endpoint(SESSIONS_PATH)?;
        let builder = Self::bearer(self.client.get(url), token)?;
        self.execute(SESSIONS_PATH, builder).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint(HEALTH_PATH)?;
        self.execute(HEALTH_PATH, self.client.get(url)).await
    }
}

/// Parse `url` and make sure relative endpoint paths resolve beneath it.
fn normalize_base_url(url: &str) -> Result<Url> {
    let mut parsed = Url::parse(url)?;
    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }
    Ok(parsed)
}

/// Extract a human-readable message from an error body.
///
/// The backend answers failures with `{"error": "..."}`; anything else is
/// reported verbatim, and an empty body falls back to the status.
fn error_message(status_code: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<String>,
    }

    if let Some(message) = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
    {
        return message;
    }
    let body = body.trim();
    if body.is_empty() {
        format!("Request failed with status {status_code}")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CompassClient::with_options(
            Some("https://compass.example.com/".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://compass.example.com/");
        assert_eq!(client.timeout(), Duration::from_secs(30));

        let client =
            CompassClient::with_options(Some(DEFAULT_API_URL.to_string()), None).unwrap();
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let client =
            CompassClient::with_options(Some("https://example.com/compass".to_string()), None)
                .unwrap();
        assert_eq!(
            client.endpoint(CHAT_PATH).unwrap().as_str(),
            "https://example.com/compass/api/chat"
        );
        assert_eq!(
            client.endpoint(HEALTH_PATH).unwrap().as_str(),
            "https://example.com/compass/health"
        );
    }

    #[test]
    fn invalid_base_url() {
        let err = CompassClient::with_options(Some("not a url".to_string()), None).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            error_message(401, r#"{"error": "Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(error_message(502, "Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(500, ""), "Request failed with status 500");
        assert_eq!(error_message(400, r#"{"detail": "x"}"#), r#"{"detail": "x"}"#);
    }
}
