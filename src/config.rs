use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Development default; the dev backend serves the API under this prefix.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings plus the directory holding the persisted session.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root, no trailing slash. Endpoint paths are appended verbatim.
    pub base_url: String,
    /// Per-request timeout on the underlying HTTP client.
    pub timeout: Duration,
    /// Directory for durable client state (the session file lives here).
    pub storage_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            storage_dir: default_storage_dir(),
        }
    }
}

impl ApiConfig {
    /// Build a config for the given API root, validating the URL shape and
    /// normalizing away a trailing slash.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| AppError::Validation(format!("Invalid API base URL: {e}")))?;
        if !parsed.scheme().starts_with("http") {
            return Err(AppError::Validation(format!(
                "Unsupported API URL scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        })
    }

    /// Resolve config from the environment.
    ///
    /// Loads a `.env` file when one is present, then honors
    /// `TASKBOARD_API_URL`, `TASKBOARD_API_TIMEOUT_SECS` and
    /// `TASKBOARD_DATA_DIR`. Anything unset falls back to the defaults.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("TASKBOARD_API_URL") {
            Ok(url) => Self::new(&url)?,
            Err(_) => Self::default(),
        };
        if let Ok(secs) = std::env::var("TASKBOARD_API_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                AppError::Validation("TASKBOARD_API_TIMEOUT_SECS must be an integer".into())
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(dir) = std::env::var("TASKBOARD_DATA_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    /// Same config pointed at a different storage directory (tests use this
    /// to keep session files out of the real data dir).
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("taskboard")
}
