// ── Core error types ──
//
// User-facing errors from taskboard-core. The `From<taskboard_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use taskboard_api::ValidationErrors;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out")]
    Timeout,

    // ── Auth errors ──────────────────────────────────────────────────
    #[error("Not authenticated -- log in first")]
    Unauthenticated,

    #[error("Credential storage failed: {message}")]
    Credentials { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Validation failed")]
    Validation { errors: ValidationErrors },

    #[error("Form field error: {message}")]
    Field { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<taskboard_api::Error> for CoreError {
    fn from(err: taskboard_api::Error) -> Self {
        use taskboard_api::Error as Api;

        if err.is_unauthorized() {
            return CoreError::Unauthenticated;
        }
        if err.is_validation() {
            return CoreError::Validation {
                errors: taskboard_api::normalize_errors(err.body()),
            };
        }

        match err {
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::Status { status: 404, .. } => CoreError::NotFound {
                path: "resource".into(),
            },
            Api::Status { status, ref body } => CoreError::Api {
                message: body
                    .as_ref()
                    .and_then(|b| b.get("message").and_then(|m| m.as_str()).map(str::to_owned))
                    .or_else(|| body.as_ref().and_then(|b| b.as_str()).map(str::to_owned))
                    .unwrap_or_else(|| format!("HTTP {status}")),
                status: Some(status),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            Api::Payload(message) => CoreError::Field { message },
            Api::Upload { path, source } => CoreError::Field {
                message: format!("cannot read {path}: {source}"),
            },
            Api::TokenStore(message) => CoreError::Credentials { message },
        }
    }
}
