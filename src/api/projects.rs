//! Project CRUD on `/projects`.

#[cfg(test)]
#[path = "projects_test.rs"]
mod projects_test;

use serde_json::json;

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use crate::types::Project;

const PROJECTS: &str = "/projects";

fn project_endpoint(id: &str) -> String {
    format!("{PROJECTS}/{id}")
}

/// # Errors
///
/// Propagates any [`ApiError`]; a 402 means the plan's project limit is reached.
pub async fn create(client: &ApiClient, name: &str) -> Result<Project, ApiError> {
    client
        .send_json(ApiRequest::post(PROJECTS).with_json_value(json!({ "name": name })))
        .await
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn list(client: &ApiClient) -> Result<Vec<Project>, ApiError> {
    client.get_json(PROJECTS).await
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn get(client: &ApiClient, id: &str) -> Result<Project, ApiError> {
    client.get_json(&project_endpoint(id)).await
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn rename(client: &ApiClient, id: &str, name: &str) -> Result<Project, ApiError> {
    client
        .send_json(ApiRequest::patch(project_endpoint(id)).with_json_value(json!({ "name": name })))
        .await
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.send_empty(ApiRequest::delete(project_endpoint(id))).await
}
