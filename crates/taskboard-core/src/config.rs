// ── Runtime client configuration ──
//
// These types describe *how* to reach the backend and how forms behave.
// They never touch disk: the CLI (via taskboard-config) builds a
// `ClientConfig` and hands it in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use taskboard_api::transport::{TlsMode, TransportConfig};
use taskboard_api::{ApiClient, TokenStore};

use crate::debounce::SEARCH_DEBOUNCE;
use crate::error::CoreError;
use crate::form::{FormOptions, RECENTLY_SUCCESSFUL_TIMEOUT};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local development backends).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., `http://localhost:8000/api`).
    pub base_url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How long a form stays "recently successful" after a submit.
    pub recently_successful_timeout: Duration,
    /// Quiet window before a search input triggers a request.
    pub search_debounce: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            recently_successful_timeout: RECENTLY_SUCCESSFUL_TIMEOUT,
            search_debounce: SEARCH_DEBOUNCE,
        }
    }

    /// Transport settings for the API client.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            ..TransportConfig::default()
        }
    }

    /// Form defaults derived from this config.
    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            recently_successful_timeout: self.recently_successful_timeout,
            ..FormOptions::default()
        }
    }

    /// Build an API client that reads its bearer token from `tokens`.
    pub fn build_client(&self, tokens: Arc<dyn TokenStore>) -> Result<ApiClient, CoreError> {
        Ok(ApiClient::new(
            self.base_url.as_str(),
            &self.transport(),
            tokens,
        )?)
    }
}
