//! In-process store implementing both storage contracts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use cookie::Cookie;

use super::{CookieJar, KeyValueStore, is_expired, mirror_cookie};
use crate::error::StoreError;

#[derive(Default)]
struct Inner {
    values: HashMap<String, String>,
    cookies: HashMap<String, Cookie<'static>>,
}

/// Ephemeral store; contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full cookie including attributes, if present and unexpired.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.lock()
            .cookies
            .get(name)
            .filter(|cookie| !is_expired(cookie))
            .cloned()
    }

    /// Insert a cookie verbatim, e.g. one that has already expired.
    pub fn put_cookie(&self, cookie: Cookie<'static>) {
        self.lock().cookies.insert(cookie.name().to_owned(), cookie);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another thread panicked mid-write of a
        // plain map; the data is still usable.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().values.remove(key);
        Ok(())
    }
}

impl CookieJar for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|cookie| cookie.value().to_owned())
    }

    fn set(&self, name: &str, value: &str, ttl_days: i64) -> Result<(), StoreError> {
        self.put_cookie(mirror_cookie(name, value, ttl_days));
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.lock().cookies.remove(name);
        Ok(())
    }
}
