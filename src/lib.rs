//! Session and authentication layer for the InsightAgent front end.
//!
//! This crate owns everything between "a visitor has credentials" and "a
//! request reaches the backend": the token store and its cookie mirror, the
//! API client with its single refresh-and-retry on 401, the session manager
//! that validates and routes the signed-in user, and typed resource calls.
//! The route guard that reads the cookie mirror lives in the `server` crate.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::SessionConfig;
pub use error::{ApiError, ConfigError, StoreError};
pub use http::{ApiClient, ReqwestTransport};
pub use navigation::{History, Navigator};
pub use session::{SessionManager, SessionState};
pub use store::TokenStore;
