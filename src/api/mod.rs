//! Typed calls for the backend's resource endpoints.
//!
//! Every call goes through [`crate::http::ApiClient`], so each one gets the
//! bearer token, the single refresh-and-retry on 401, and the typed
//! quota/size errors without doing anything itself.

pub mod admin;
pub mod agent;
pub mod projects;
pub mod subscription;
pub mod upload;
