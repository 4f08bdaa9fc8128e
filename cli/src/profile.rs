//! On-disk profile: where a terminal session keeps its tokens.
//!
//! A profile directory holds `credentials.json` (the durable token store) and
//! `cookies.json` (the cookie mirror). Every command builds a fresh
//! `SessionManager` over these files, so the session survives between runs
//! exactly like a browser tab that is closed and reopened.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use insight_session::http::Transport;
use insight_session::store::{FileCookieJar, FileStore};
use insight_session::{ApiClient, History, ReqwestTransport, SessionConfig, SessionManager, TokenStore};

use crate::CliError;

const CREDENTIALS_FILE: &str = "credentials.json";
const COOKIES_FILE: &str = "cookies.json";
const PROFILE_DIR_NAME: &str = ".insight";

/// `$HOME/.insight`, or `./.insight` when no home directory is known.
pub fn default_profile_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(PROFILE_DIR_NAME)
}

pub fn token_store(dir: &Path, cookie_ttl_days: i64) -> TokenStore {
    TokenStore::new(
        Arc::new(FileStore::new(dir.join(CREDENTIALS_FILE))),
        Arc::new(FileCookieJar::new(dir.join(COOKIES_FILE))),
        cookie_ttl_days,
    )
}

/// A session wired to the profile, positioned on the page `location`.
pub struct Profile {
    pub session: SessionManager,
    pub history: Arc<History>,
}

impl Profile {
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be built.
    pub fn open(config: &SessionConfig, dir: &Path, location: &str) -> Result<Self, CliError> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.timeouts)?);
        Ok(Self::with_transport(config, dir, location, transport))
    }

    pub fn with_transport(config: &SessionConfig, dir: &Path, location: &str, transport: Arc<dyn Transport>) -> Self {
        tracing::debug!(profile = %dir.display(), location, api = %config.api_origin, "opening profile");
        let history = Arc::new(History::new(location));
        let tokens = token_store(dir, config.cookie_ttl_days);
        let client = ApiClient::new(config, transport, tokens, history.clone());
        Self { session: SessionManager::new(config, client), history }
    }

    pub fn client(&self) -> &ApiClient {
        self.session.client()
    }

    /// Tell the user where the session moved them, e.g. to the login page
    /// after the stored session was rejected.
    pub fn report_navigation(&self, login_path: &str) {
        for target in self.history.navigations() {
            if target.starts_with(login_path) {
                eprintln!("session ended; run `insight login` to sign in again");
            } else {
                eprintln!("-> {target}");
            }
        }
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
