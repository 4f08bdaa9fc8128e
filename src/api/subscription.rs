//! Plans and per-user usage.

#[cfg(test)]
#[path = "subscription_test.rs"]
mod subscription_test;

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use crate::types::{Plan, Tier, UsageData};

const PLANS: &str = "/subscription/plans";
const USAGE: &str = "/subscription/usage";

/// Public plan catalogue. Works without a session.
///
/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn plans(client: &ApiClient) -> Result<Vec<Plan>, ApiError> {
    client.get_json(PLANS).await
}

/// Replace a tier's limits and price. Admin only.
///
/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn update_plan(client: &ApiClient, tier: &Tier, plan: &Plan) -> Result<(), ApiError> {
    let request = ApiRequest::put(format!("{PLANS}/{tier}")).with_json(plan)?;
    client.send_empty(request).await
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn usage(client: &ApiClient) -> Result<UsageData, ApiError> {
    client.get_json(USAGE).await
}
