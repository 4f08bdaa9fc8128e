//! User administration on `/users`. Every call requires an admin session.

#[cfg(test)]
#[path = "admin_test.rs"]
mod admin_test;

use serde_json::json;

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use crate::types::{AdminUser, Role, Tier, UserPage, UserStats};

const USERS: &str = "/users";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filters for [`list`]. Empty filters are not sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub tier: Option<Tier>,
    pub role: Option<Role>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE, search: None, tier: None, role: None }
    }
}

impl UserQuery {
    fn into_request(self) -> ApiRequest {
        let mut request = ApiRequest::get(USERS)
            .with_query("page", self.page.to_string())
            .with_query("limit", self.limit.to_string());
        if let Some(search) = self.search.filter(|s| !s.is_empty()) {
            request = request.with_query("search", search);
        }
        if let Some(tier) = self.tier {
            request = request.with_query("tier", tier.as_str());
        }
        if let Some(role) = self.role {
            request = request.with_query("role", role.as_str());
        }
        request
    }
}

fn user_endpoint(id: &str) -> String {
    format!("{USERS}/{id}")
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn list(client: &ApiClient, query: UserQuery) -> Result<UserPage, ApiError> {
    client.send_json(query.into_request()).await
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn stats(client: &ApiClient) -> Result<UserStats, ApiError> {
    client.get_json(&format!("{USERS}/stats")).await
}

/// First user whose email matches `email`, if any.
///
/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn find_by_email(client: &ApiClient, email: &str) -> Result<Option<AdminUser>, ApiError> {
    let query = UserQuery { limit: 1, search: Some(email.to_owned()), ..UserQuery::default() };
    let page = list(client, query).await?;
    Ok(page.users.into_iter().next())
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn set_tier(client: &ApiClient, id: &str, tier: &Tier) -> Result<(), ApiError> {
    let request = ApiRequest::patch(format!("{}/tier", user_endpoint(id))).with_json_value(json!({ "tier": tier }));
    client.send_empty(request).await
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn set_role(client: &ApiClient, id: &str, role: &Role) -> Result<(), ApiError> {
    let request = ApiRequest::patch(format!("{}/role", user_endpoint(id))).with_json_value(json!({ "role": role }));
    client.send_empty(request).await
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.send_empty(ApiRequest::delete(user_endpoint(id))).await
}
