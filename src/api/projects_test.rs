use serde_json::json;

use super::*;
use crate::http::RequestBody;
use crate::test_support::Harness;

fn project(id: &str, name: &str) -> serde_json::Value {
    json!({ "id": id, "name": name, "createdAt": "2024-05-01T00:00:00Z", "tables": [] })
}

#[test]
fn project_endpoint_appends_id() {
    assert_eq!(project_endpoint("p1"), "/projects/p1");
}

#[tokio::test]
async fn create_posts_name() {
    let h = Harness::at("/projects").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("POST /projects", 201, project("p1", "Sales"));

    let created = create(&h.client, "Sales").await.unwrap();

    assert_eq!(created.id, "p1");
    assert_eq!(created.created_at.as_deref(), Some("2024-05-01T00:00:00Z"));
    assert_eq!(h.transport.sent()[0].request.body, RequestBody::Json(json!({ "name": "Sales" })));
}

#[tokio::test]
async fn create_over_limit_is_quota_error() {
    let h = Harness::at("/projects").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("POST /projects", 402, json!({ "message": "Project limit reached" }));

    let err = create(&h.client, "Sales").await.unwrap_err();

    assert!(matches!(err, ApiError::QuotaExceeded { ref message, .. } if message == "Project limit reached"));
}

#[tokio::test]
async fn list_and_get_decode_projects() {
    let h = Harness::at("/projects").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("GET /projects", 200, json!([project("p1", "Sales"), project("p2", "Ops")]));
    h.transport.respond("GET /projects/p2", 200, project("p2", "Ops"));

    let all = list(&h.client).await.unwrap();
    let one = get(&h.client, "p2").await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(one.name, "Ops");
}

#[tokio::test]
async fn rename_patches_and_delete_ignores_body() {
    let h = Harness::at("/projects").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("PATCH /projects/p1", 200, project("p1", "Revenue"));
    h.transport.respond("DELETE /projects/p1", 204, serde_json::Value::Null);

    assert_eq!(rename(&h.client, "p1", "Revenue").await.unwrap().name, "Revenue");
    delete(&h.client, "p1").await.unwrap();

    assert_eq!(h.transport.count("DELETE /projects/p1"), 1);
}
