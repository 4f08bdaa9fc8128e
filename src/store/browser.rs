//! Browser-backed stores and navigation for the `hydrate` build.
//!
//! `localStorage` is the durable store and `document.cookie` holds the
//! mirror the route guard reads. Each call looks up `window` afresh so the
//! handles stay `Send + Sync` unit values.

use cookie::Cookie;
use time::OffsetDateTime;
use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, Storage};

use super::{CookieJar, KeyValueStore, mirror_cookie};
use crate::error::StoreError;
use crate::navigation::Navigator;

fn local_storage() -> Result<Storage, StoreError> {
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .ok_or_else(|| StoreError::Unavailable("localStorage".to_owned()))
}

fn html_document() -> Result<HtmlDocument, StoreError> {
    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.dyn_into::<HtmlDocument>().ok())
        .ok_or_else(|| StoreError::Unavailable("document".to_owned()))
}

fn js_error(value: &wasm_bindgen::JsValue) -> StoreError {
    StoreError::Io(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// `window.localStorage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        local_storage().ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        local_storage()?.set_item(key, value).map_err(|e| js_error(&e))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        local_storage()?.remove_item(key).map_err(|e| js_error(&e))
    }
}

/// `document.cookie`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentCookies;

impl DocumentCookies {
    fn write(cookie: &Cookie<'_>) -> Result<(), StoreError> {
        html_document()?
            .set_cookie(&cookie.to_string())
            .map_err(|e| js_error(&e))
    }
}

impl CookieJar for DocumentCookies {
    fn get(&self, name: &str) -> Option<String> {
        let header = html_document().ok()?.cookie().ok()?;
        Cookie::split_parse(header)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_owned())
    }

    fn set(&self, name: &str, value: &str, ttl_days: i64) -> Result<(), StoreError> {
        Self::write(&mirror_cookie(name, value, ttl_days))
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        let expired = Cookie::build((name.to_owned(), String::new()))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build();
        Self::write(&expired)
    }
}

/// `window.location`. Navigation is a full page load.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserLocation;

impl Navigator for BrowserLocation {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|window| window.location().pathname().ok())
            .unwrap_or_else(|| "/".to_owned())
    }

    fn query_param(&self, name: &str) -> Option<String> {
        let search = web_sys::window()?.location().search().ok()?;
        url::form_urlencoded::parse(search.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn navigate(&self, to: &str) {
        let Some(window) = web_sys::window() else {
            tracing::warn!(target_path = to, "no window; navigation dropped");
            return;
        };
        if let Err(e) = window.location().assign(to) {
            tracing::warn!(target_path = to, error = ?e, "navigation failed");
        }
    }
}
