//! Session lifecycle: startup validation, login, register, logout, and the
//! page-level redirects that depend on who is signed in.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionManager` is the only writer of the signed-in user. It is built
//! explicitly around an `ApiClient` and shared by reference (typically in an
//! `Arc`) with whatever renders pages; observers follow state changes through
//! `subscribe()`. Token persistence and the login redirect on a lost session
//! belong to the client and its `TokenStore`.
//!
//! ROUTING REACTION
//! ================
//! Once loading has finished, a signed-in user is moved home when the
//! current page is the login or register page, or when it is an admin page
//! and the user is not an admin. The reaction runs after `start`, `login`
//! and `register`, and on every path delivered to `watch_routes`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::config::{ADMIN_PREFIX, RETURN_PATH_PARAM, SessionConfig};
use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use crate::navigation::{Navigator, is_local_path};
use crate::types::{AuthResponse, LoginRequest, MeResponse, RegisterRequest, UserSummary};

pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const REGISTER_ENDPOINT: &str = "/auth/register";
pub const ME_ENDPOINT: &str = "/auth/me";

/// Snapshot published to observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserSummary>,
    /// True until startup validation has finished.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

pub struct SessionManager {
    client: ApiClient,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    register_path: String,
    home_path: String,
    state: watch::Sender<SessionState>,
    started: AtomicBool,
}

impl SessionManager {
    /// Build a manager around `client`, navigating through the client's navigator.
    #[must_use]
    pub fn new(config: &SessionConfig, client: ApiClient) -> Self {
        let navigator = client.navigator().clone();
        let (state, _) = watch::channel(SessionState::default());
        Self {
            client,
            navigator,
            login_path: config.login_path.clone(),
            register_path: config.register_path.clone(),
            home_path: config.home_path.clone(),
            state,
            started: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserSummary> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Validate any stored session. Only the first call does anything.
    ///
    /// With no stored access token this makes no network call. Otherwise it
    /// asks the backend who the token belongs to; any failure clears the
    /// stored credentials and leaves the session signed out.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let user = if self.client.tokens().access_token().is_some() {
            self.validate().await
        } else {
            tracing::debug!("no stored access token; starting signed out");
            None
        };

        self.state.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
        self.sync_route();
    }

    async fn validate(&self) -> Option<UserSummary> {
        match self.client.get_json::<MeResponse>(ME_ENDPOINT).await {
            Ok(me) => {
                // The call may have refreshed the pair; mirror whatever is current.
                if let Some(token) = self.client.tokens().access_token() {
                    self.client.tokens().sync_cookie(&token);
                }
                tracing::info!(user_id = %me.user.id, "session restored");
                Some(me.user)
            }
            Err(e) => {
                tracing::info!(error = %e, "stored session rejected; signing out");
                self.client.tokens().clear();
                None
            }
        }
    }

    /// Sign in and go to the page the visitor was bounced from, or home.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged; nothing is stored on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary, ApiError> {
        let request = ApiRequest::post(LOGIN_ENDPOINT).with_json(&LoginRequest { email, password })?;
        let user = self.establish(request).await?;

        let target = self
            .navigator
            .query_param(RETURN_PATH_PARAM)
            .filter(|from| is_local_path(from))
            .unwrap_or_else(|| self.home_path.clone());
        self.navigator.navigate(&target);
        self.sync_route();
        Ok(user)
    }

    /// Create an account, sign in, and go home.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged; nothing is stored on failure.
    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> Result<UserSummary, ApiError> {
        let request =
            ApiRequest::post(REGISTER_ENDPOINT).with_json(&RegisterRequest { email, password, name })?;
        let user = self.establish(request).await?;

        self.navigator.navigate(&self.home_path);
        self.sync_route();
        Ok(user)
    }

    async fn establish(&self, request: ApiRequest) -> Result<UserSummary, ApiError> {
        let auth: AuthResponse = self.client.send_json(request).await?;
        self.client.tokens().store_credentials(&auth.credentials)?;
        tracing::info!(user_id = %auth.user.id, role = %auth.user.role, "signed in");

        let user = auth.user;
        self.state.send_modify(|state| state.user = Some(user.clone()));
        Ok(user)
    }

    /// Forget the session locally and go to the login page. Never fails.
    pub fn logout(&self) {
        self.client.tokens().clear();
        self.state.send_modify(|state| state.user = None);
        tracing::info!("signed out");
        self.navigator.navigate(&self.login_path);
    }

    // =========================================================================
    // ROUTING
    // =========================================================================

    /// Apply the routing reaction to the current location.
    ///
    /// Returns the path navigated to, if any.
    pub fn sync_route(&self) -> Option<String> {
        let (loading, user) = {
            let state = self.state.borrow();
            (state.loading, state.user.clone())
        };
        if loading {
            return None;
        }
        let user = user?;

        let path = self.navigator.current_path();
        let on_auth_page = path == self.login_path || path == self.register_path;
        let forbidden_admin = is_under(&path, ADMIN_PREFIX) && !user.is_admin();
        if !on_auth_page && !forbidden_admin {
            return None;
        }

        tracing::debug!(%path, admin_gate = forbidden_admin, "redirecting signed-in user home");
        self.navigator.navigate(&self.home_path);
        Some(self.home_path.clone())
    }

    /// Re-run the routing reaction for every path change until the sender closes.
    pub async fn watch_routes(&self, mut paths: watch::Receiver<String>) {
        while paths.changed().await.is_ok() {
            self.sync_route();
        }
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
