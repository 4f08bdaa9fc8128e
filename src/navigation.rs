//! Location access and programmatic navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! The HTTP client redirects to the login page when a session is lost and the
//! session manager routes after login/logout. Both go through `Navigator` so
//! the same logic drives a browser tab, a terminal client, or a test.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use url::Url;

const LOCAL_ORIGIN: &str = "http://localhost/";

/// Read the current location and move to another one.
pub trait Navigator: Send + Sync {
    /// Path component of the current location, e.g. `/login`.
    fn current_path(&self) -> String;

    /// Decoded value of a query parameter on the current location.
    fn query_param(&self, name: &str) -> Option<String>;

    /// Move to `to`, a path with an optional query string.
    fn navigate(&self, to: &str);
}

/// Resolve an app-relative target (`/login?from=%2Fusage`) against a dummy origin.
pub(crate) fn resolve(to: &str) -> Option<Url> {
    Url::parse(LOCAL_ORIGIN).ok()?.join(to).ok()
}

/// Accept only same-app paths as post-login destinations.
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

// =============================================================================
// IN-MEMORY HISTORY
// =============================================================================

struct HistoryInner {
    path: String,
    query: Option<String>,
    navigations: Vec<String>,
}

/// In-memory location stack for native clients and tests.
///
/// Programmatic moves (`navigate`) are recorded; user-driven moves (`visit`)
/// are not. Every location change is published to subscribers as a path.
pub struct History {
    inner: Mutex<HistoryInner>,
    paths: watch::Sender<String>,
}

impl History {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        let (path, query) = match resolve(initial) {
            Some(url) => (url.path().to_owned(), url.query().map(str::to_owned)),
            None => ("/".to_owned(), None),
        };
        let (paths, _) = watch::channel(path.clone());
        Self { inner: Mutex::new(HistoryInner { path, query, navigations: Vec::new() }), paths }
    }

    /// Simulate the user opening `to` directly (address bar, link, reload).
    pub fn visit(&self, to: &str) {
        self.set_location(to, false);
    }

    /// Every programmatic navigation so far, oldest first.
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Current location as `path?query`.
    #[must_use]
    pub fn current(&self) -> String {
        let inner = self.lock();
        match &inner.query {
            Some(query) => format!("{}?{query}", inner.path),
            None => inner.path.clone(),
        }
    }

    /// Stream of path changes, starting with the current path.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.paths.subscribe()
    }

    fn set_location(&self, to: &str, record: bool) {
        let Some(next) = resolve(to) else {
            tracing::warn!(target_path = to, "ignoring unresolvable navigation target");
            return;
        };
        let path = next.path().to_owned();
        {
            let mut inner = self.lock();
            inner.path.clone_from(&path);
            inner.query = next.query().map(str::to_owned);
            if record {
                inner.navigations.push(to.to_owned());
            }
        }
        self.paths.send_replace(path);
    }

    fn lock(&self) -> MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn current_path(&self) -> String {
        self.lock().path.clone()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        let inner = self.lock();
        let query = inner.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn navigate(&self, to: &str) {
        tracing::debug!(target_path = to, "navigate");
        self.set_location(to, true);
    }
}
