// taskboard-core: Form controllers and session state on top of taskboard-api.

pub mod config;
pub mod debounce;
pub mod error;
pub mod form;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, TlsVerification};
pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use error::CoreError;
pub use form::{
    FormController, FormData, FormOptions, RECENTLY_SUCCESSFUL_TIMEOUT, SubmitOptions, SubmitOutcome,
};
pub use session::{Session, SessionState, SessionStatus};

// Re-export the transport types consumers need alongside the core.
pub use taskboard_api::models;
pub use taskboard_api::{
    ApiClient, ApiResponse, Error as ApiError, ErrorMessages, FileUpload, HttpMethod,
    MemoryTokenStore, TokenStore, ValidationErrors,
};
