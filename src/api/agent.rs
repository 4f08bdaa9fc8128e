//! Natural-language queries and table previews.

#[cfg(test)]
#[path = "agent_test.rs"]
mod agent_test;

use serde_json::{Value, json};

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use crate::types::{DataEnvelope, QueryResult};

pub const DEFAULT_PREVIEW_LIMIT: u32 = 10;

fn preview_endpoint(project_id: &str, table: &str) -> String {
    format!("/agent/preview/{project_id}/{table}")
}

/// Ask a question about a project's data.
///
/// # Errors
///
/// [`ApiError::QuotaExceeded`] when the monthly query allowance is used up;
/// any other [`ApiError`] unchanged.
pub async fn query(client: &ApiClient, project_id: &str, question: &str) -> Result<QueryResult, ApiError> {
    let request =
        ApiRequest::post("/agent/query").with_json_value(json!({ "projectId": project_id, "question": question }));
    let envelope: DataEnvelope<QueryResult> = client.send_json(request).await?;
    Ok(envelope.data)
}

/// First `limit` rows of a table, as loose JSON objects.
///
/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn preview_table(
    client: &ApiClient,
    project_id: &str,
    table: &str,
    limit: u32,
) -> Result<Vec<Value>, ApiError> {
    let request = ApiRequest::get(preview_endpoint(project_id, table)).with_query("limit", limit.to_string());
    let envelope: DataEnvelope<Vec<Value>> = client.send_json(request).await?;
    Ok(envelope.data)
}
