use super::*;

fn creds(access: &str, refresh: &str) -> Credentials {
    Credentials { access_token: access.to_owned(), refresh_token: refresh.to_owned() }
}

struct FailingCookies;

impl CookieJar for FailingCookies {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }

    fn set(&self, _name: &str, _value: &str, _ttl_days: i64) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("no cookies here".to_owned()))
    }

    fn remove(&self, _name: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("no cookies here".to_owned()))
    }
}

// =============================================================================
// mirror_cookie
// =============================================================================

#[test]
fn mirror_cookie_sets_path_same_site_and_expiry() {
    let cookie = mirror_cookie(ACCESS_TOKEN_COOKIE, "at-1", 7);
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));

    let expires = cookie.expires_datetime().unwrap();
    let remaining = expires - OffsetDateTime::now_utc();
    assert!(remaining > Duration::days(6) && remaining <= Duration::days(7));
    assert!(!is_expired(&cookie));
}

#[test]
fn mirror_cookie_with_negative_ttl_is_expired() {
    assert!(is_expired(&mirror_cookie(ACCESS_TOKEN_COOKIE, "x", -1)));
}

// =============================================================================
// TokenStore
// =============================================================================

#[test]
fn store_credentials_writes_both_keys_and_mirrors_access_token() {
    let tokens = TokenStore::in_memory(7);

    tokens.store_credentials(&creds("at-1", "rt-1")).unwrap();

    assert_eq!(tokens.access_token().as_deref(), Some("at-1"));
    assert_eq!(tokens.refresh_token().as_deref(), Some("rt-1"));
    assert_eq!(tokens.cookie_token(), tokens.access_token());
}

#[test]
fn refresh_token_is_never_mirrored() {
    let store = Arc::new(MemoryStore::new());
    let tokens = TokenStore::new(store.clone(), store.clone(), 7);

    tokens.store_credentials(&creds("at-1", "rt-1")).unwrap();

    assert!(store.cookie(REFRESH_TOKEN_KEY).is_none());
}

#[test]
fn clear_removes_tokens_and_cookie() {
    let tokens = TokenStore::in_memory(7);
    tokens.store_credentials(&creds("at-1", "rt-1")).unwrap();

    tokens.clear();

    assert_eq!(tokens.access_token(), None);
    assert_eq!(tokens.refresh_token(), None);
    assert_eq!(tokens.cookie_token(), None);
}

#[test]
fn empty_token_reads_as_absent() {
    let store = Arc::new(MemoryStore::new());
    KeyValueStore::set(store.as_ref(), ACCESS_TOKEN_KEY, "").unwrap();
    let tokens = TokenStore::new(store.clone(), store, 7);

    assert_eq!(tokens.access_token(), None);
}

#[test]
fn cookie_failures_do_not_fail_credential_writes_or_clear() {
    let durable = Arc::new(MemoryStore::new());
    let tokens = TokenStore::new(durable, Arc::new(FailingCookies), 7);

    tokens.store_credentials(&creds("at-1", "rt-1")).unwrap();
    assert_eq!(tokens.access_token().as_deref(), Some("at-1"));

    tokens.clear();
    assert_eq!(tokens.access_token(), None);
}

#[test]
fn sync_cookie_restores_expired_mirror() {
    let store = Arc::new(MemoryStore::new());
    let tokens = TokenStore::new(store.clone(), store.clone(), 7);
    tokens.store_credentials(&creds("at-1", "rt-1")).unwrap();
    store.put_cookie(mirror_cookie(ACCESS_TOKEN_COOKIE, "at-1", -1));
    assert_eq!(tokens.cookie_token(), None);

    tokens.sync_cookie("at-1");

    assert_eq!(tokens.cookie_token().as_deref(), Some("at-1"));
}
