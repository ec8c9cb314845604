use crate::error::RetrievalResult;

const DEFAULT_URL: &str = "http://localhost:6334";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the Qdrant gRPC endpoint.
///
/// Environment variables and their defaults:
/// - `QDRANT_URL`: endpoint URL (default `http://localhost:6334`)
/// - `QDRANT_API_KEY`: optional; unset means no auth
/// - `QDRANT_TIMEOUT_SECS`: request timeout (default `30`)
///
/// An unparseable timeout falls back to the default rather than failing
/// startup.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn from_env() -> RetrievalResult<Self> {
        let url = std::env::var("QDRANT_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());

        let api_key = std::env::var("QDRANT_API_KEY").ok();

        let timeout_secs = std::env::var("QDRANT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            url,
            api_key,
            timeout_secs,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("QDRANT_URL", None::<&str>),
                ("QDRANT_API_KEY", None),
                ("QDRANT_TIMEOUT_SECS", None),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert_eq!(config.url, "http://localhost:6334");
                assert_eq!(config.api_key, None);
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_from_env_reads_values() {
        temp_env::with_vars(
            [
                ("QDRANT_URL", Some("http://qdrant.internal:6334")),
                ("QDRANT_API_KEY", Some("secret")),
                ("QDRANT_TIMEOUT_SECS", Some("5")),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert_eq!(config.url, "http://qdrant.internal:6334");
                assert_eq!(config.api_key.as_deref(), Some("secret"));
                assert_eq!(config.timeout_secs, 5);
            },
        );
    }

    #[test]
    fn test_from_env_unparseable_timeout_falls_back() {
        temp_env::with_var("QDRANT_TIMEOUT_SECS", Some("soon"), || {
            let config = QdrantConfig::from_env().unwrap();
            assert_eq!(config.timeout_secs, 30);
        });
    }

    #[test]
    fn test_builder_methods() {
        let config = QdrantConfig::new("http://localhost:6334")
            .with_api_key("secret".to_string())
            .with_timeout(10);

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 10);
    }
}
