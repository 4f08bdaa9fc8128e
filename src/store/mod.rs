//! Credential persistence: the durable store and its cookie mirror.
//!
//! ARCHITECTURE
//! ============
//! Two media hold the same access token. The durable key/value store is what
//! the app reads; the cookie exists only so the route guard, which runs in a
//! different process and sees nothing but request cookies, can tell whether
//! a visitor has ever signed in. `TokenStore` is the only writer of both and
//! keeps them aligned on every credential write and on every clear.
//!
//! TRADE-OFFS
//! ==========
//! The mirror is best-effort: a failed cookie write is logged and ignored,
//! because the session still works and the guard only degrades to a redirect
//! the client recovers from. Clearing never fails, so logout can't be
//! blocked by a broken store.

pub mod file;
pub mod memory;

#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
pub mod browser;

use std::sync::Arc;

use cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use crate::error::StoreError;
use crate::types::Credentials;

pub use file::{FileCookieJar, FileStore};
pub use memory::MemoryStore;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Cookie read by the route guard. Only the access token is ever mirrored.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

// =============================================================================
// CONTRACTS
// =============================================================================

/// Durable string key/value storage surviving process restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns an error if the removal could not be persisted.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Cookie storage. Expired cookies read as absent.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    /// Store `name=value` with `path=/`, `SameSite=Strict` and an expiry
    /// `ttl_days` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie could not be persisted.
    fn set(&self, name: &str, value: &str, ttl_days: i64) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns an error if the deletion could not be persisted.
    fn remove(&self, name: &str) -> Result<(), StoreError>;
}

/// Build the mirror cookie exactly as the browser receives it.
#[must_use]
pub fn mirror_cookie(name: &str, value: &str, ttl_days: i64) -> Cookie<'static> {
    Cookie::build((name.to_owned(), value.to_owned()))
        .path("/")
        .same_site(SameSite::Strict)
        .expires(OffsetDateTime::now_utc() + Duration::days(ttl_days))
        .build()
}

/// True when the cookie carries an expiry that has already passed.
#[must_use]
pub fn is_expired(cookie: &Cookie<'_>) -> bool {
    cookie
        .expires_datetime()
        .is_some_and(|expires| expires <= OffsetDateTime::now_utc())
}

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Single source of truth for the access/refresh pair and its cookie mirror.
#[derive(Clone)]
pub struct TokenStore {
    durable: Arc<dyn KeyValueStore>,
    cookies: Arc<dyn CookieJar>,
    cookie_ttl_days: i64,
}

impl TokenStore {
    #[must_use]
    pub fn new(durable: Arc<dyn KeyValueStore>, cookies: Arc<dyn CookieJar>, cookie_ttl_days: i64) -> Self {
        Self { durable, cookies, cookie_ttl_days }
    }

    /// Token store backed by one in-memory store for both media.
    #[must_use]
    pub fn in_memory(cookie_ttl_days: i64) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, cookie_ttl_days)
    }

    /// Token store over `localStorage` and `document.cookie`.
    #[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
    #[must_use]
    pub fn browser(cookie_ttl_days: i64) -> Self {
        Self::new(Arc::new(browser::LocalStorage), Arc::new(browser::DocumentCookies), cookie_ttl_days)
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.durable.get(ACCESS_TOKEN_KEY).filter(|token| !token.is_empty())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.durable.get(REFRESH_TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// Current value of the cookie mirror, as the route guard would see it.
    #[must_use]
    pub fn cookie_token(&self) -> Option<String> {
        self.cookies.get(ACCESS_TOKEN_COOKIE)
    }

    /// Persist a freshly issued pair and mirror the access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable store rejects either token. Cookie
    /// mirror failures are logged, not returned.
    pub fn store_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.durable.set(ACCESS_TOKEN_KEY, &credentials.access_token)?;
        self.durable.set(REFRESH_TOKEN_KEY, &credentials.refresh_token)?;
        self.sync_cookie(&credentials.access_token);
        Ok(())
    }

    /// Re-write the cookie mirror with `token` and a fresh expiry.
    pub fn sync_cookie(&self, token: &str) {
        if let Err(e) = self.cookies.set(ACCESS_TOKEN_COOKIE, token, self.cookie_ttl_days) {
            tracing::warn!(error = %e, "failed to write access-token cookie");
        }
    }

    /// Remove both tokens and delete the cookie mirror.
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.durable.remove(key) {
                tracing::warn!(error = %e, key, "failed to remove stored token");
            }
        }
        if let Err(e) = self.cookies.remove(ACCESS_TOKEN_COOKIE) {
            tracing::warn!(error = %e, "failed to delete access-token cookie");
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
