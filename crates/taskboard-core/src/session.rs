// ── Session context ──
//
// Authentication state for one process: the current user, whether a
// session is established, and the loading flags a front end renders.
// Only the operations here write the persisted bearer token.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use taskboard_api::ApiClient;
use taskboard_api::models::{LoginResponse, User};

use crate::error::CoreError;

/// Observable session record.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    /// `true` until the first profile fetch completes.
    pub is_loading: bool,
    pub is_logout_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            is_loading: true,
            is_logout_loading: false,
        }
    }
}

impl SessionState {
    /// Derived from the user's role; never stored.
    pub fn is_role_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }
}

/// Result of [`Session::fetch_authenticated_user`].
///
/// `Unauthenticated` and `Unreachable` leave the same state behind; the
/// distinction only tells callers whether the backend answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated,
    /// The backend answered without a user (no body, 401, other 4xx).
    Unauthenticated,
    /// The profile request failed in transport or with a server error.
    Unreachable,
}

struct SessionInner {
    client: ApiClient,
    state: watch::Sender<SessionState>,
}

/// Shared session handle. Clones observe and mutate the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(SessionInner { client, state }),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_role_admin(&self) -> bool {
        self.inner.state.borrow().is_role_admin()
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.inner.state.send_modify(f);
    }

    // ── Operations ───────────────────────────────────────────────

    /// Load the current profile and record whether a session exists.
    ///
    /// Any failure, including 401, leaves the session unauthenticated.
    /// Concurrent calls are not deduplicated; the last one to finish wins.
    pub async fn fetch_authenticated_user(&self) -> SessionStatus {
        self.update(|s| s.is_loading = true);

        let (user, status) = match self.inner.client.current_user().await {
            Ok(Some(user)) => (Some(user), SessionStatus::Authenticated),
            Ok(None) => {
                debug!("profile request returned no user");
                (None, SessionStatus::Unauthenticated)
            }
            Err(e) if e.is_unauthorized() => {
                debug!("profile request unauthorized");
                (None, SessionStatus::Unauthenticated)
            }
            Err(e) if e.status().is_some_and(|code| code < 500) => {
                debug!(error = %e, "profile request rejected");
                (None, SessionStatus::Unauthenticated)
            }
            Err(e) => {
                warn!(error = %e, "profile request failed, treating session as signed out");
                (None, SessionStatus::Unreachable)
            }
        };

        if let Some(user) = &user {
            info!(user = %user.email, role = %user.role, "session authenticated");
        }
        self.update(|s| {
            s.is_authenticated = user.is_some();
            s.user = user;
            s.is_loading = false;
        });
        status
    }

    /// Record a successful login or registration: persist the token and
    /// mark the user as authenticated.
    pub fn establish(&self, response: LoginResponse) -> Result<(), CoreError> {
        let LoginResponse { user, token } = response;
        self.inner
            .client
            .tokens()
            .store(&SecretString::from(token))?;
        info!(user = %user.email, "session established");
        self.update(|s| {
            s.is_authenticated = true;
            s.user = Some(user);
            s.is_loading = false;
        });
        Ok(())
    }

    /// End the session.
    ///
    /// The backend call is best effort: the local token and user state are
    /// cleared whatever it returns. Only a failure to clear the token store
    /// is reported.
    pub async fn logout(&self) -> Result<(), CoreError> {
        self.update(|s| s.is_logout_loading = true);

        if let Err(e) = self.inner.client.logout().await {
            warn!(error = %e, "backend logout failed, clearing local session anyway");
        }

        let cleared = self.inner.client.tokens().clear();
        self.update(|s| {
            s.is_authenticated = false;
            s.user = None;
            s.is_logout_loading = false;
        });
        info!("session cleared");
        cleared.map_err(CoreError::from)
    }
}
