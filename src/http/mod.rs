//! HTTP plumbing between the app and the backend API.

pub mod client;
pub mod policy;
pub mod request;
pub mod transport;

pub use client::ApiClient;
pub use policy::{Attempt, DEFAULT_RESPONSE_POLICIES, ResponsePolicy};
pub use request::{ApiRequest, ApiResponse, FormPart, RequestBody};
pub use transport::{ReqwestTransport, Transport};
