/// App-wide error type. Every fallible function returns `Result<T, AppError>`.
///
/// The variants follow the failure taxonomy of the client: transport-level
/// failures (no response at all), server-rejected requests (4xx/5xx with a
/// message payload), client-side validation that blocks a request before it
/// is issued, and the storage/serde plumbing around the persisted session.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Transport-level failure: DNS, refused connection, timeout. The request
    /// never produced a status code.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status and (usually) a
    /// `{ "message": ... }` payload.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable tag, for consumers that map errors to UI copy.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Http(_) => "http",
            AppError::Api { .. } => "api",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Auth(_) => "auth",
            AppError::Io(_) => "io",
            AppError::Serde(_) => "serde",
            AppError::Internal(_) => "internal",
        }
    }

    /// True when the failure happened before any response arrived, the
    /// "is the server even running" case the UI words differently.
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Http(_))
    }
}
