// taskboard-api: Async Rust client for the Taskboard REST API

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod payload;
pub mod token;
pub mod transport;
pub mod validation;

pub use client::{ApiClient, ApiResponse, HttpMethod, ProgressFn, RequestSpec};
pub use error::Error;
pub use payload::{FileUpload, FormEntry, Payload};
pub use token::{MemoryTokenStore, TOKEN_KEY, TokenStore};
pub use transport::{TlsMode, TransportConfig};
pub use validation::{ErrorMessages, ValidationErrors, normalize_errors};
