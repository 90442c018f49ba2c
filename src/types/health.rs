use serde::{Deserialize, Serialize};

/// Response body of `GET /health`.
///
/// `status` is `ready` when the backend has model credentials and
/// `degraded` when it falls back to a canned reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `ready` or `degraded`.
    pub status: String,

    /// Deployment environment name.
    #[serde(default)]
    pub env: Option<String>,

    /// Database state, `ok` or `down`.
    #[serde(default)]
    pub db: Option<String>,

    /// Cache state, `ok` or `down`.
    #[serde(default)]
    pub redis: Option<String>,
}

impl HealthStatus {
    /// True when the backend can produce model replies.
    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn degraded() {
        let health: HealthStatus = serde_json::from_value(json!({
            "status": "degraded",
            "env": "development",
            "db": "ok",
            "redis": "down"
        }))
        .unwrap();
        assert!(!health.is_ready());
        assert_eq!(health.redis.as_deref(), Some("down"));
    }
}
