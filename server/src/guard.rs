//! Route guard: send cookie-less visitors of protected pages to the login page.
//!
//! DESIGN
//! ======
//! The guard only checks that the `accessToken` cookie is present and
//! non-empty. It never validates the token; a stale cookie gets through and
//! the client-side session validation signs the visitor out. The login and
//! register pages are never protected, so the guard can't loop.
//!
//! Asset and API paths are skipped before any prefix check, mirroring the
//! request matcher of the front end's edge middleware.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use insight_session::config::{LOGIN_PATH, RETURN_PATH_PARAM};
use insight_session::store::ACCESS_TOKEN_COOKIE;

/// Leading path segments the guard never looks at.
const SKIPPED_PREFIXES: [&str; 4] = ["api", "_next/static", "_next/image", "favicon.ico"];

#[derive(Clone, Debug)]
pub struct RouteGuard {
    protected: Arc<[String]>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(protected: Vec<String>) -> Self {
        Self { protected: protected.into() }
    }

    /// Where to send a request for `path`, or `None` to let it through.
    #[must_use]
    pub fn redirect_for(&self, path: &str, access_cookie: Option<&str>) -> Option<String> {
        if is_skipped(path) || !self.is_protected(path) {
            return None;
        }
        if access_cookie.is_some_and(|token| !token.is_empty()) {
            return None;
        }
        Some(login_location(path))
    }

    fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

fn is_skipped(path: &str) -> bool {
    let rest = path.trim_start_matches('/');
    SKIPPED_PREFIXES.iter().any(|prefix| rest.starts_with(prefix))
}

/// `/login?from=<path>` with the path form-encoded.
#[must_use]
pub fn login_location(path: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(RETURN_PATH_PARAM, path)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

/// Axum middleware applying [`RouteGuard`] to every request.
pub async fn route_guard(State(guard): State<RouteGuard>, jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let token = jar.get(ACCESS_TOKEN_COOKIE).map(|cookie| cookie.value().to_owned());

    let Some(location) = guard.redirect_for(&path, token.as_deref()) else {
        return next.run(request).await;
    };

    tracing::debug!(%path, %location, "no access-token cookie; redirecting to login");
    match HeaderValue::from_str(&location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(e) => {
            tracing::warn!(%path, error = %e, "unencodable login redirect");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
