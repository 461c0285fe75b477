//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use taskboard_config::ConfigError;
use taskboard_core::{CoreError, ValidationErrors};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const VALIDATION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the API at {url}")]
    #[diagnostic(
        code(taskboard::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             URL: {url}\n\
             Try: taskboard --base-url <URL> whoami"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(taskboard::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Not logged in")]
    #[diagnostic(
        code(taskboard::not_logged_in),
        help("Run: taskboard login")
    )]
    NotLoggedIn,

    #[error("Credential storage failed: {message}")]
    #[diagnostic(
        code(taskboard::credentials),
        help("Switch storage with: taskboard config set token_storage file")
    )]
    Credentials { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Not found: {path}")]
    #[diagnostic(
        code(taskboard::not_found),
        help("Run: taskboard {list_command} to see what exists")
    )]
    NotFound { path: String, list_command: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("The backend rejected the input")]
    #[diagnostic(code(taskboard::rejected), help("{details}"))]
    Rejected { details: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(taskboard::validation))]
    Validation { field: String, reason: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error: {message}")]
    #[diagnostic(code(taskboard::api_error))]
    Api { message: String, status: Option<u16> },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(taskboard::config),
        help("Inspect the file with: taskboard config show")
    )]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(taskboard::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unexpected response: {0}")]
    #[diagnostic(code(taskboard::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotLoggedIn | Self::Credentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::VALIDATION,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// A rejection listing every field error, one per line.
    pub fn rejected(errors: &ValidationErrors) -> Self {
        let details = errors
            .iter()
            .map(|(field, messages)| format!("{field}: {messages}"))
            .collect::<Vec<_>>()
            .join("\n");
        Self::Rejected { details }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Unauthenticated => CliError::NotLoggedIn,
            CoreError::Credentials { message } => CliError::Credentials { message },
            CoreError::NotFound { path } => {
                let list_command = if path.contains("/tasks") {
                    "tasks --project <ID> list"
                } else {
                    "projects list"
                };
                CliError::NotFound {
                    path,
                    list_command: list_command.into(),
                }
            }
            CoreError::Validation { errors } => CliError::rejected(&errors),
            CoreError::Field { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Serialization(e) => CliError::Json(e),
            CoreError::Api { message, status } => CliError::Api { message, status },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<taskboard_core::ApiError> for CliError {
    fn from(err: taskboard_core::ApiError) -> Self {
        CoreError::from(err).into()
    }
}
