//! Client configuration.

use std::time::Duration;

/// Configuration for the detection service client.
#[derive(Debug, Clone)]
pub struct DetectClientConfig {
    /// Base URL of the detection service (batch endpoints).
    pub base_url: String,
    /// URL of the streaming endpoint.
    pub stream_url: String,
    /// Per-request timeout for batch calls.
    pub timeout: Duration,
    /// Max retries for retryable batch failures. 0 = single shot.
    pub max_retries: u32,
}

impl Default for DetectClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            stream_url: "ws://localhost:8080/stream".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 0,
        }
    }
}

impl DetectClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("FIREWATCH_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            stream_url: std::env::var("FIREWATCH_STREAM_URL")
                .unwrap_or_else(|_| "ws://localhost:8080/stream".to_string()),
            timeout: Duration::from_secs(
                std::env::var("FIREWATCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("FIREWATCH_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DetectClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 0);
    }
}
