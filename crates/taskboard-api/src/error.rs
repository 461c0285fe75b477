use serde_json::Value;
use thiserror::Error;

/// Top-level error type for the `taskboard-api` crate.
///
/// Covers transport, backend status, payload encoding, and credential
/// storage failures. `taskboard-core` wraps these in its own error type.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// The backend answered with a non-success status.
    ///
    /// `body` holds the parsed JSON payload, or the raw text as a JSON
    /// string when the body was not JSON. `None` when the body was empty.
    #[error("Request failed (HTTP {status})")]
    Status { status: u16, body: Option<Value> },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The outgoing payload could not be built.
    #[error("Invalid request payload: {0}")]
    Payload(String),

    /// A file referenced by an upload could not be read.
    #[error("Cannot read upload {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Credentials ─────────────────────────────────────────────────
    /// The persisted token could not be read or written.
    #[error("Token store error: {0}")]
    TokenStore(String),
}

impl Error {
    /// HTTP status of a backend failure, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Response body of a backend failure.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` for a `422 Unprocessable Entity` validation failure.
    pub fn is_validation(&self) -> bool {
        self.status() == Some(422)
    }

    /// Returns `true` if the backend rejected the bearer credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
