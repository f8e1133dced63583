//! End-to-end requests through the assembled router.

use http::{Method, StatusCode};
use serde_json::json;

use backoffice_api::routes::auth::INVALID_CREDENTIALS;
use backoffice_api::seed::{DEMO_ADMIN, DEMO_USER};
use backoffice_core::RecordId;

use crate::common::{TestHarness, fields};

async fn login(harness: &TestHarness, email: &str, password: &str) -> String {
    let (status, body) = harness
        .send(
            Method::POST,
            "/auth/token",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let harness = TestHarness::seeded().await;
    let (status, body) = harness.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let harness = TestHarness::seeded().await;
    for uri in ["/calculations", "/users", "/roles", "/permissions", "/me", "/dashboard/summary"] {
        let (status, body) = harness.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "unauthorized");
    }

    let (status, _) = harness
        .send(Method::GET, "/calculations", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_and_me() {
    let harness = TestHarness::seeded().await;
    let (status, body) = harness
        .send(
            Method::POST,
            "/auth/token",
            None,
            Some(json!({ "email": DEMO_USER.email, "password": DEMO_USER.password })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], DEMO_USER.email);
    assert_eq!(body["data"]["user"]["roles"], json!(["User"]));
    let token = body["data"]["token"].as_str().unwrap();

    let (status, me) = harness.send(Method::GET, "/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], DEMO_USER.email);
    let permissions: Vec<&str> = me["data"]["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    let mut sorted = permissions.clone();
    sorted.sort();
    assert_eq!(permissions, sorted);
    assert_eq!(permissions.len(), 7);
    assert!(permissions.contains(&"calculate:create:own"));
}

#[tokio::test]
async fn test_bad_credentials_share_one_message() {
    let harness = TestHarness::seeded().await;
    let (wrong_password, a) = harness
        .send(
            Method::POST,
            "/auth/token",
            None,
            Some(json!({ "email": DEMO_ADMIN.email, "password": "nope" })),
        )
        .await;
    let (unknown_email, b) = harness
        .send(
            Method::POST,
            "/auth/token",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "nope" })),
        )
        .await;
    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(a, b);
    assert_eq!(a["message"], INVALID_CREDENTIALS);

    let (status, body) = harness
        .send(Method::POST, "/auth/token", None, Some(json!({ "email": DEMO_ADMIN.email })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_admin_created_account_logs_in_with_the_exact_password() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    harness
        .users()
        .create(
            &admin,
            fields(json!({ "email": "p@example.com", "name": "P", "password": " secret " })),
        )
        .await
        .unwrap();

    let token = login(&harness, "p@example.com", " secret ").await;
    let (status, me) = harness.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "p@example.com");

    let (status, _) = harness
        .send(
            Method::POST,
            "/auth/token",
            None,
            Some(json!({ "email": "p@example.com", "password": "secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration() {
    let harness = TestHarness::seeded().await;
    let payload = json!({
        "name": "Fresh",
        "email": "Fresh@Example.com",
        "password": "pw-fresh",
        "role_ids": [RecordId::new()],
    });

    let (status, body) = harness
        .send(Method::POST, "/auth/register", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["email"], "fresh@example.com");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = harness
        .send(Method::POST, "/auth/register", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = harness
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": "NoPass", "email": "np@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The client-chosen roles were ignored.
    let token = login(&harness, "fresh@example.com", "pw-fresh").await;
    let (_, me) = harness.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(me["data"]["roles"], json!(["User"]));
}

#[tokio::test]
async fn test_standard_account_calculation_flow() {
    let harness = TestHarness::seeded().await;
    let token = login(&harness, DEMO_USER.email, DEMO_USER.password).await;
    let user = harness.user().await;
    let forged_owner = RecordId::new();

    let (status, body) = harness
        .send(
            Method::POST,
            "/calculations",
            Some(&token),
            Some(json!({
                "ad_spend": 1000,
                "cost_per_result": 10,
                "average_order_value": 25,
                "user_id": forged_owner,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Created");
    assert_eq!(body["data"]["user_id"], json!(user.id));
    assert_eq!(body["data"]["roi_percentage"], json!(150.0));
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, list) = harness.send(Method::GET, "/calculations", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let (status, fetched) = harness
        .send(Method::GET, &format!("/calculations/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["id"], id.as_str());

    // The User role has no update or delete grant for calculations.
    let (status, body) = harness
        .send(
            Method::PUT,
            &format!("/calculations/{id}"),
            Some(&token),
            Some(json!({ "ad_spend": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    let (status, _) = harness
        .send(Method::DELETE, &format!("/calculations/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_status_codes_for_scoped_access() {
    let harness = TestHarness::seeded().await;
    let user_token = login(&harness, DEMO_USER.email, DEMO_USER.password).await;
    let admin_token = login(&harness, DEMO_ADMIN.email, DEMO_ADMIN.password).await;
    let admin = harness.admin().await;

    let (status, _) = harness.send(Method::GET, "/roles", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = harness.send(Method::GET, "/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["data"].as_array().unwrap().len(), 1);

    let (status, body) = harness
        .send(Method::GET, &format!("/users/{}", admin.id), Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = harness
        .send(Method::GET, "/users/not-a-uuid", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, users) = harness.send(Method::GET, "/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = users["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));

    let (status, roles) = harness.send(Method::GET, "/roles", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roles["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let harness = TestHarness::seeded().await;
    let token = login(&harness, DEMO_ADMIN.email, DEMO_ADMIN.password).await;

    let (status, body) = harness
        .send(Method::POST, "/calculations", Some(&token), Some(json!([1, 2, 3])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = harness
        .send(
            Method::POST,
            "/calculations",
            Some(&token),
            Some(json!({ "ad_spend": -5, "cost_per_result": 1, "average_order_value": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("ad_spend"));
}

#[tokio::test]
async fn test_dashboard_summary_scope() {
    let harness = TestHarness::seeded().await;
    let user_token = login(&harness, DEMO_USER.email, DEMO_USER.password).await;
    let admin_token = login(&harness, DEMO_ADMIN.email, DEMO_ADMIN.password).await;

    for (token, spend) in [(&user_token, 500), (&admin_token, 1000)] {
        let (status, _) = harness
            .send(
                Method::POST,
                "/calculations",
                Some(token),
                Some(json!({ "ad_spend": spend, "cost_per_result": 50, "average_order_value": 20 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // The User role holds `dashboard:read:any`.
    let (status, body) = harness
        .send(Method::GET, "/dashboard/summary", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["scope"], "any");
    assert_eq!(body["data"]["calculation_count"], 2);
    assert_eq!(body["data"]["critical_count"], 2);
    assert_eq!(body["data"]["total_principals"], 2);
}
