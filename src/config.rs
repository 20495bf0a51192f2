use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ApiError;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CREDENTIALS_FILE: &str = ".vantage/credentials.json";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub credentials_path: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = std::env::var("VANTAGE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(ApiError::configuration("VANTAGE_API_URL must not be empty"));
        }

        let timeout_secs = std::env::var("VANTAGE_TIMEOUT_SECS")
            .map(|val| val.parse::<u64>())
            .unwrap_or(Ok(DEFAULT_TIMEOUT_SECS))
            .map_err(|_| ApiError::configuration("VANTAGE_TIMEOUT_SECS must be a valid integer"))?;

        let credentials_path = match std::env::var("VANTAGE_CREDENTIALS_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_credentials_path(),
        };

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            credentials_path,
        })
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credentials_path: default_credentials_path(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }
}

fn default_credentials_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(CREDENTIALS_FILE),
        Err(_) => PathBuf::from(CREDENTIALS_FILE),
    }
}
