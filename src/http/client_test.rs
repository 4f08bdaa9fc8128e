use serde_json::json;

use super::*;
use crate::http::{FormPart, RequestBody};
use crate::navigation::Navigator;
use crate::test_support::Harness;

fn pair(access: &str, refresh: &str) -> serde_json::Value {
    json!({ "accessToken": access, "refreshToken": refresh })
}

#[tokio::test]
async fn attaches_stored_access_token() {
    let h = Harness::at("/projects").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("GET /projects", 200, json!([]));

    h.client.send(ApiRequest::get("/projects")).await.unwrap();

    let sent = h.transport.sent();
    assert_eq!(sent[0].bearer.as_deref(), Some("at-1"));
    assert_eq!(sent[0].url, "http://localhost:3001/api/projects");
}

#[tokio::test]
async fn anonymous_request_carries_no_bearer() {
    let h = Harness::at("/");
    h.transport.respond("GET /subscription/plans", 200, json!([]));

    h.client.send(ApiRequest::get("/subscription/plans")).await.unwrap();

    assert_eq!(h.transport.sent()[0].bearer, None);
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() {
    let h = Harness::at("/projects").with_tokens("old-at", Some("rt-1"));
    h.transport.respond("GET /projects", 401, json!({ "message": "expired" }));
    h.transport.respond("POST /auth/refresh", 200, pair("new-at", "new-rt"));
    h.transport.respond("GET /projects", 200, json!([{ "id": "p1", "name": "Sales" }]));

    let response = h.client.send(ApiRequest::get("/projects")).await.unwrap();

    assert_eq!(response.status, 200);
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1].bearer.as_deref(), Some("rt-1"));
    assert_eq!(sent[2].bearer.as_deref(), Some("new-at"));
    assert_eq!(h.tokens.access_token().as_deref(), Some("new-at"));
    assert_eq!(h.tokens.refresh_token().as_deref(), Some("new-rt"));
    assert!(h.history.navigations().is_empty());
}

#[tokio::test]
async fn cookie_mirror_follows_refreshed_token() {
    let h = Harness::at("/usage").with_tokens("old-at", Some("rt-1"));
    h.transport.respond("GET /subscription/usage", 401, serde_json::Value::Null);
    h.transport.respond("POST /auth/refresh", 200, pair("new-at", "new-rt"));
    h.transport.respond("GET /subscription/usage", 200, json!({}));

    h.client.send(ApiRequest::get("/subscription/usage")).await.unwrap();

    assert_eq!(h.tokens.cookie_token(), h.tokens.access_token());
    assert_eq!(h.tokens.cookie_token().as_deref(), Some("new-at"));
}

#[tokio::test]
async fn retried_request_is_never_refreshed_twice() {
    let h = Harness::at("/projects").with_tokens("old-at", Some("rt-1"));
    h.transport.respond("GET /projects", 401, serde_json::Value::Null);
    h.transport.respond("POST /auth/refresh", 200, pair("new-at", "new-rt"));
    h.transport.respond("GET /projects", 401, json!({ "message": "still no" }));

    let err = h.client.send(ApiRequest::get("/projects")).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "still no");
    assert_eq!(h.transport.count("POST /auth/refresh"), 1);
    assert_eq!(h.transport.count("GET /projects"), 2);
}

#[tokio::test]
async fn failed_refresh_ends_session_and_surfaces_refresh_error() {
    let h = Harness::at("/projects").with_tokens("old-at", Some("rt-1"));
    h.transport.respond("GET /projects", 401, serde_json::Value::Null);
    h.transport.respond("POST /auth/refresh", 401, json!({ "message": "refresh revoked" }));

    let err = h.client.send(ApiRequest::get("/projects")).await.unwrap_err();

    match &err {
        ApiError::Status { status, url, message, .. } => {
            assert_eq!(*status, 401);
            assert!(url.ends_with("/auth/refresh"));
            assert_eq!(message.as_deref(), Some("refresh revoked"));
        }
        other => panic!("expected refresh status error, got {other:?}"),
    }
    assert_eq!(h.tokens.access_token(), None);
    assert_eq!(h.tokens.refresh_token(), None);
    assert_eq!(h.tokens.cookie_token(), None);
    assert_eq!(h.history.navigations(), vec!["/login".to_owned()]);
    assert_eq!(h.transport.count("GET /projects"), 1);
}

#[tokio::test]
async fn refresh_transport_failure_is_surfaced() {
    let h = Harness::at("/projects").with_tokens("old-at", Some("rt-1"));
    h.transport.respond("GET /projects", 401, serde_json::Value::Null);
    h.transport.fail("POST /auth/refresh", ApiError::Transport("connection reset".to_owned()));

    let err = h.client.send(ApiRequest::get("/projects")).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(h.tokens.access_token(), None);
    assert_eq!(h.history.current_path(), "/login");
}

#[tokio::test]
async fn missing_refresh_token_clears_and_returns_original_401() {
    let h = Harness::at("/admin").with_tokens("old-at", None);
    h.transport.respond("GET /admin/stats", 401, json!({ "message": "unauthorized" }));

    let err = h.client.send(ApiRequest::get("/admin/stats")).await.unwrap_err();

    match err {
        ApiError::Status { status, url, .. } => {
            assert_eq!(status, 401);
            assert!(url.ends_with("/admin/stats"));
        }
        other => panic!("expected original 401, got {other:?}"),
    }
    assert_eq!(h.transport.count("POST /auth/refresh"), 0);
    assert_eq!(h.tokens.access_token(), None);
    assert_eq!(h.history.navigations(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn no_redirect_when_already_on_login_page() {
    let h = Harness::at("/login?from=%2Fprojects").with_tokens("old-at", Some("rt-1"));
    h.transport.respond("GET /auth/me", 401, serde_json::Value::Null);
    h.transport.respond("POST /auth/refresh", 401, serde_json::Value::Null);

    h.client.send(ApiRequest::get("/auth/me")).await.unwrap_err();

    assert!(h.history.navigations().is_empty());
    assert_eq!(h.history.current(), "/login?from=%2Fprojects");
    assert_eq!(h.tokens.access_token(), None);
}

#[tokio::test]
async fn quota_exceeded_uses_backend_message_without_refresh() {
    let h = Harness::at("/projects/p1").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("POST /agent/query", 402, json!({ "message": "Query limit reached" }));

    let err = h.client.send(ApiRequest::post("/agent/query")).await.unwrap_err();

    assert!(matches!(err, ApiError::QuotaExceeded { .. }));
    assert_eq!(err.to_string(), "Query limit reached");
    assert_eq!(err.body().unwrap()["message"], "Query limit reached");
    assert_eq!(h.transport.count("POST /auth/refresh"), 0);
    assert_eq!(h.tokens.access_token().as_deref(), Some("at-1"));
    assert!(h.history.navigations().is_empty());
}

#[tokio::test]
async fn quota_exceeded_falls_back_to_default_message() {
    let h = Harness::at("/").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("POST /projects", 402, serde_json::Value::Null);

    let err = h.client.send(ApiRequest::post("/projects")).await.unwrap_err();

    assert_eq!(err.to_string(), DEFAULT_QUOTA_MESSAGE);
}

#[tokio::test]
async fn payload_too_large_falls_back_to_default_message() {
    let h = Harness::at("/projects/p1").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("POST /upload", 413, json!({ "error": "too big" }));

    let err = h.client.send(ApiRequest::post("/upload")).await.unwrap_err();

    assert!(matches!(err, ApiError::PayloadTooLarge { .. }));
    assert_eq!(err.to_string(), DEFAULT_PAYLOAD_MESSAGE);
    assert_eq!(h.transport.count("POST /auth/refresh"), 0);
}

#[tokio::test]
async fn other_statuses_pass_through_unchanged() {
    let h = Harness::at("/projects").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("DELETE /projects/p9", 404, json!({ "message": "Project not found" }));

    let err = h.client.send(ApiRequest::delete("/projects/p9")).await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.message(), "Project not found");
    assert_eq!(h.tokens.access_token().as_deref(), Some("at-1"));
}

#[tokio::test]
async fn transport_failure_passes_through() {
    let h = Harness::at("/");
    h.transport.fail("GET /projects", ApiError::Transport("dns".to_owned()));

    let err = h.client.send(ApiRequest::get("/projects")).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(ref m) if m == "dns"));
}

#[tokio::test]
async fn policies_can_be_narrowed() {
    let h = Harness::at("/projects").with_tokens("at-1", Some("rt-1"));
    let client = h.client.clone().with_policies(vec![ResponsePolicy::QuotaExceeded]);
    h.transport.respond("GET /projects", 401, serde_json::Value::Null);

    let err = client.send(ApiRequest::get("/projects")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.transport.count("POST /auth/refresh"), 0);
    assert_eq!(h.tokens.access_token().as_deref(), Some("at-1"));
}

#[tokio::test]
async fn multipart_body_survives_resubmission() {
    let h = Harness::at("/projects/p1").with_tokens("old-at", Some("rt-1"));
    h.transport.respond("POST /upload", 401, serde_json::Value::Null);
    h.transport.respond("POST /auth/refresh", 200, pair("new-at", "new-rt"));
    h.transport.respond("POST /upload", 200, json!({ "data": {} }));
    let parts = vec![FormPart::Text { name: "projectId".to_owned(), value: "p1".to_owned() }];

    h.client
        .send(ApiRequest::post("/upload").with_multipart(parts.clone()))
        .await
        .unwrap();

    let sent = h.transport.sent();
    assert_eq!(sent[2].request.body, RequestBody::Multipart(parts));
}

#[tokio::test]
async fn send_json_decodes_body() {
    let h = Harness::at("/");
    h.transport.respond("GET /auth/me", 200, json!({ "user": crate::test_support::user_json("u1", "USER") }));

    let me: crate::types::MeResponse = h.client.get_json("/auth/me").await.unwrap();

    assert_eq!(me.user.id, "u1");
}
