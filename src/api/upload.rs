//! Dataset upload into a project, and table removal.

#[cfg(test)]
#[path = "upload_test.rs"]
mod upload_test;

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest, FormPart};
use crate::types::{DataEnvelope, UploadResult};

const UPLOAD: &str = "/upload";

fn table_endpoint(project_id: &str, table: &str) -> String {
    format!("{UPLOAD}/{project_id}/{table}")
}

/// MIME type for the spreadsheet formats the backend ingests.
fn content_type_for(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "csv" => Some("text/csv"),
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        "xls" => Some("application/vnd.ms-excel"),
        "json" => Some("application/json"),
        _ => None,
    }
}

/// Upload `bytes` as `file_name` into `project_id`.
///
/// Sent as `multipart/form-data` with a `file` part and a `projectId` field.
///
/// # Errors
///
/// [`ApiError::PayloadTooLarge`] when the file exceeds the plan's size limit;
/// any other [`ApiError`] unchanged.
pub async fn upload_file(
    client: &ApiClient,
    project_id: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<UploadResult, ApiError> {
    let parts = vec![
        FormPart::File {
            name: "file".to_owned(),
            file_name: file_name.to_owned(),
            content_type: content_type_for(file_name).map(str::to_owned),
            bytes,
        },
        FormPart::Text { name: "projectId".to_owned(), value: project_id.to_owned() },
    ];
    let envelope: DataEnvelope<UploadResult> =
        client.send_json(ApiRequest::post(UPLOAD).with_multipart(parts)).await?;
    Ok(envelope.data)
}

/// # Errors
///
/// Propagates any [`ApiError`].
pub async fn delete_table(client: &ApiClient, project_id: &str, table: &str) -> Result<(), ApiError> {
    client.send_empty(ApiRequest::delete(table_endpoint(project_id, table))).await
}
