//! Error types for the Uni-Bot core library.
//!
//! Every failure that can reach the user ends up as a single human-readable
//! message in the controller's error slot, so the `Display` output of each
//! variant is written for the user rather than for a log file.
//!
//! | Category | Variants |
//! |----------|----------|
//! | Transport | `Transport`, `Timeout` |
//! | Response | `NonJsonResponse`, `Api`, `Decode` |
//! | Local state | `Store`, `Io`, `Json` |
//! | Setup | `Config`, `Credential` |

use thiserror::Error;

/// The main error type for the Uni-Bot core library.
#[derive(Debug, Error)]
pub enum UnibotError {
    /// The request never produced an HTTP response.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The request timed out before a response arrived.
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// The backend (or a proxy in front of it) answered with something that
    /// is not JSON.
    #[error("API {url} returned non-JSON response ({status}). Check backend/proxy configuration.")]
    NonJsonResponse { url: String, status: u16 },

    /// Non-2xx response. `message` is the `detail` field when the backend
    /// sent one.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The body was JSON but not the expected shape.
    #[error("Failed to parse API response: {0}")]
    Decode(String),

    #[error("Session state error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential helper failed: {0}")]
    Credential(String),
}

/// Result type alias for Uni-Bot operations.
pub type UnibotResult<T> = Result<T, UnibotError>;

impl UnibotError {
    /// Build an [`UnibotError::Api`] from a status code and an optional
    /// `detail` taken from the response body.
    pub fn api(status: u16, detail: Option<String>) -> Self {
        let message = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed: {}", status));
        UnibotError::Api { status, message }
    }

    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UnibotError::Timeout(url.to_string())
        } else if err.is_decode() {
            UnibotError::Decode(err.to_string())
        } else {
            UnibotError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// The text shown in the UI error slot.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Returns true if the next poll tick might succeed where this one failed.
    pub fn is_transient(&self) -> bool {
        match self {
            UnibotError::Transport { .. } | UnibotError::Timeout(_) => true,
            UnibotError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            UnibotError::Api { status, .. } | UnibotError::NonJsonResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
