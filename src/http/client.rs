//! Authenticated API client.
//!
//! ARCHITECTURE
//! ============
//! `send` runs one loop iteration per submission:
//!
//! 1. attach the stored access token unless the request already has one
//! 2. hand the request to the transport
//! 3. on a non-2xx response or transport failure, run the policy list
//!
//! A `RefreshOnce` verdict produces a new request carrying the refreshed
//! token; the loop resubmits it with the next `Attempt`. Policies never
//! resubmit a retried attempt, so every call ends after at most one refresh
//! and one resubmission.
//!
//! TRADE-OFFS
//! ==========
//! Concurrent requests that each hit 401 each run their own refresh. The
//! backend issues a fresh pair per refresh, so the last pair written to the
//! token store wins and every in-flight retry still carries a valid token.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::policy::{
    Attempt, DEFAULT_PAYLOAD_MESSAGE, DEFAULT_QUOTA_MESSAGE, DEFAULT_RESPONSE_POLICIES, ResponsePolicy, Verdict,
};
use super::request::{ApiRequest, ApiResponse};
use super::transport::Transport;
use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::navigation::Navigator;
use crate::store::TokenStore;
use crate::types::Credentials;

pub const REFRESH_PATH: &str = "/auth/refresh";

/// What went wrong with one submission.
enum Failure {
    Response(ApiResponse),
    Transport(ApiError),
}

impl Failure {
    fn status(&self) -> Option<u16> {
        match self {
            Self::Response(response) => Some(response.status),
            Self::Transport(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    api_base: String,
    login_path: String,
    policies: Vec<ResponsePolicy>,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        config: &SessionConfig,
        transport: Arc<dyn Transport>,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            tokens,
            navigator,
            api_base: config.api_base(),
            login_path: config.login_path.clone(),
            policies: DEFAULT_RESPONSE_POLICIES.to_vec(),
        }
    }

    /// Replace the response policy list. Order is evaluation order.
    #[must_use]
    pub fn with_policies(mut self, policies: Vec<ResponsePolicy>) -> Self {
        self.policies = policies;
        self
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    // =========================================================================
    // SENDING
    // =========================================================================

    /// Send `request` through the policy chain, returning the 2xx response.
    ///
    /// # Errors
    ///
    /// Returns the error chosen by the first policy that rejects, the refresh
    /// error when a refresh fails, or the unchanged failure otherwise.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut request = request;
        let mut attempt = Attempt::FIRST;
        loop {
            let prepared = self.authorize(request);
            let url = prepared.url(&self.api_base);
            let failure = match self.transport.send(&url, &prepared).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => Failure::Response(response),
                Err(error) => Failure::Transport(error),
            };

            request = self.recover(&prepared, &url, attempt, failure).await?;
            attempt = attempt.next();
        }
    }

    /// Send and decode the body as `T`.
    ///
    /// # Errors
    ///
    /// See [`Self::send`]; additionally [`ApiError::Parse`] on a body mismatch.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    /// Send and discard the body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    /// `GET path` decoded as `T`.
    ///
    /// # Errors
    ///
    /// See [`Self::send_json`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }

    fn authorize(&self, mut request: ApiRequest) -> ApiRequest {
        if request.bearer.is_none() {
            request.bearer = self.tokens.access_token();
        }
        request
    }

    // =========================================================================
    // RECOVERY
    // =========================================================================

    async fn recover(
        &self,
        request: &ApiRequest,
        url: &str,
        attempt: Attempt,
        failure: Failure,
    ) -> Result<ApiRequest, ApiError> {
        for policy in &self.policies {
            match self.apply(*policy, request, attempt, &failure).await {
                Verdict::Pass => {}
                Verdict::Reject(error) => return Err(error),
                Verdict::Resubmit(next) => return Ok(next),
            }
        }

        let status = failure.status();
        let error = match failure {
            Failure::Response(response) => status_error(request, url, &response),
            Failure::Transport(error) => error,
        };
        tracing::error!(
            url,
            method = %request.method,
            status = ?status,
            body = ?error.body(),
            message = %error,
            attempt = %attempt,
            "API request failed"
        );
        Err(error)
    }

    async fn apply(&self, policy: ResponsePolicy, request: &ApiRequest, attempt: Attempt, failure: &Failure) -> Verdict {
        let Failure::Response(response) = failure else {
            return Verdict::Pass;
        };
        if response.status != policy.status() {
            return Verdict::Pass;
        }

        match policy {
            ResponsePolicy::QuotaExceeded => {
                let message = response.backend_message().unwrap_or_else(|| DEFAULT_QUOTA_MESSAGE.to_owned());
                tracing::warn!(path = %request.path, %message, "subscription limit reached");
                Verdict::Reject(ApiError::QuotaExceeded { message, body: response.body_json() })
            }
            ResponsePolicy::PayloadTooLarge => {
                let message = response.backend_message().unwrap_or_else(|| DEFAULT_PAYLOAD_MESSAGE.to_owned());
                tracing::warn!(path = %request.path, %message, "file size limit exceeded");
                Verdict::Reject(ApiError::PayloadTooLarge { message, body: response.body_json() })
            }
            ResponsePolicy::RefreshOnce if attempt.is_retry() => Verdict::Pass,
            ResponsePolicy::RefreshOnce => self.refresh_and_resubmit(request).await,
        }
    }

    async fn refresh_and_resubmit(&self, request: &ApiRequest) -> Verdict {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            tracing::info!(path = %request.path, "no refresh token; ending session");
            self.end_session();
            return Verdict::Pass;
        };

        match self.refresh(&refresh_token).await {
            Ok(credentials) => {
                if let Err(e) = self.tokens.store_credentials(&credentials) {
                    tracing::warn!(error = %e, "failed to persist refreshed tokens; ending session");
                    self.end_session();
                    return Verdict::Reject(e.into());
                }
                tracing::info!(path = %request.path, "access token refreshed; resubmitting");
                Verdict::Resubmit(request.clone().with_bearer(credentials.access_token))
            }
            Err(error) => {
                tracing::warn!(error = %error, "token refresh failed; ending session");
                self.end_session();
                Verdict::Reject(error)
            }
        }
    }

    /// `POST /auth/refresh` with the refresh token as bearer, outside the policy chain.
    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .with_json_value(serde_json::Value::Object(serde_json::Map::new()))
            .with_bearer(refresh_token);
        let url = request.url(&self.api_base);
        let response = self.transport.send(&url, &request).await?;
        if !response.is_success() {
            return Err(status_error(&request, &url, &response));
        }
        response.json()
    }

    /// Drop stored credentials and go to the login page unless already there.
    fn end_session(&self) {
        self.tokens.clear();
        let current = self.navigator.current_path();
        if current.starts_with(&self.login_path) {
            tracing::debug!(%current, "already on login page; not redirecting");
            return;
        }
        self.navigator.navigate(&self.login_path);
    }
}

fn status_error(request: &ApiRequest, url: &str, response: &ApiResponse) -> ApiError {
    ApiError::Status {
        status: response.status,
        method: request.method.to_string(),
        url: url.to_owned(),
        body: response.body_json(),
        message: response.backend_message(),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
