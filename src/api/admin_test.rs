use serde_json::json;

use super::*;
use crate::http::RequestBody;
use crate::test_support::Harness;

fn admin_user(id: &str, email: &str) -> serde_json::Value {
    json!({
        "id": id,
        "email": email,
        "role": "USER",
        "tier": "PRO",
        "queriesUsed": 7,
        "createdAt": "2024-01-01T00:00:00Z",
        "_count": { "projects": 2 }
    })
}

#[test]
fn query_skips_empty_filters() {
    let request = UserQuery { search: Some(String::new()), tier: Some(Tier::Pro), ..UserQuery::default() }
        .into_request();
    assert_eq!(request.url("http://x/api"), "http://x/api/users?page=1&limit=20&tier=PRO");
}

#[tokio::test]
async fn list_decodes_page_and_counts() {
    let h = Harness::at("/admin/users").with_tokens("at-1", Some("rt-1"));
    h.transport.respond(
        "GET /users",
        200,
        json!({
            "users": [admin_user("u2", "c@d.com")],
            "pagination": { "page": 1, "limit": 20, "total": 1, "totalPages": 1 }
        }),
    );

    let page = list(&h.client, UserQuery { role: Some(Role::User), ..UserQuery::default() }).await.unwrap();

    assert_eq!(page.users[0].count.projects, 2);
    assert_eq!(page.pagination.unwrap().total_pages, 1);
    assert!(h.transport.sent()[0].url.ends_with("role=USER"));
}

#[tokio::test]
async fn find_by_email_returns_first_match() {
    let h = Harness::at("/admin/plans").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("GET /users", 200, json!({ "users": [admin_user("u2", "c@d.com")] }));
    h.transport.respond("GET /users", 200, json!({ "users": [] }));

    let found = find_by_email(&h.client, "c@d.com").await.unwrap();
    let missing = find_by_email(&h.client, "nobody@d.com").await.unwrap();

    assert_eq!(found.map(|u| u.id).as_deref(), Some("u2"));
    assert!(missing.is_none());
    assert!(h.transport.sent()[0].url.contains("limit=1&search=c%40d.com"));
}

#[tokio::test]
async fn tier_and_role_changes_patch_user() {
    let h = Harness::at("/admin/users").with_tokens("at-1", Some("rt-1"));
    h.transport.respond("PATCH /users/u2/tier", 200, json!({}));
    h.transport.respond("PATCH /users/u2/role", 200, json!({}));

    set_tier(&h.client, "u2", &Tier::Enterprise).await.unwrap();
    set_role(&h.client, "u2", &Role::Admin).await.unwrap();

    let sent = h.transport.sent();
    assert_eq!(sent[0].request.body, RequestBody::Json(json!({ "tier": "ENTERPRISE" })));
    assert_eq!(sent[1].request.body, RequestBody::Json(json!({ "role": "ADMIN" })));
}

#[tokio::test]
async fn stats_and_delete() {
    let h = Harness::at("/admin").with_tokens("at-1", Some("rt-1"));
    h.transport.respond(
        "GET /users/stats",
        200,
        json!({ "totalUsers": 3, "totalProjects": 5, "totalQueries": 99, "tierDistribution": { "FREE": 2, "PRO": 1 } }),
    );
    h.transport.respond("DELETE /users/u3", 200, json!({ "success": true }));

    let totals = stats(&h.client).await.unwrap();
    delete(&h.client, "u3").await.unwrap();

    assert_eq!(totals.tier_distribution["FREE"], 2);
    assert_eq!(h.transport.count("DELETE /users/u3"), 1);
}
