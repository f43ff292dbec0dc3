// Error type returned by every `ApiClient` operation. Each call yields
// either its success payload or one of these variants, never both.

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status. `details` holds
    /// whatever body came back, parsed as JSON when possible.
    #[error("{action} failed with status {status}")]
    Status {
        action: &'static str,
        status: u16,
        details: Option<ErrorDetails>,
    },

    #[error("no changes specified")]
    NoChanges,

    #[error("'{0}' is not a file")]
    NotAFile(String),

    #[error("no download URL returned for '{0}'")]
    MissingDownloadUrl(String),

    #[error("invalid download URL '{0}'")]
    BadDownloadUrl(String),

    #[error("downloading file content failed with status {status}")]
    Download { status: u16 },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ApiError::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status attached to the error, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::Download { status } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            ApiError::Status { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

/// Body of an error response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetails {
    Json(Value),
    Text(String),
}

impl ErrorDetails {
    /// Build details from a raw response body. Empty bodies carry no details.
    pub fn from_body(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        Some(match serde_json::from_str(body) {
            Ok(value) => ErrorDetails::Json(value),
            Err(_) => ErrorDetails::Text(body.to_string()),
        })
    }

    /// The service's own `message` field when present, otherwise the body.
    pub fn message(&self) -> String {
        match self {
            ErrorDetails::Json(value) => match value.get("message").and_then(Value::as_str) {
                Some(msg) => msg.to_string(),
                None => value.to_string(),
            },
            ErrorDetails::Text(text) => text.clone(),
        }
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}
