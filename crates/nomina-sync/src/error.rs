use thiserror::Error;

/// Failure to obtain a bearer token from the session provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("no active session")]
    NoSession,
    #[error("session provider failed: {0}")]
    Provider(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[cfg(feature = "http")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API reported failure: {0}")]
    Api(String),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Source(String),
}
