//! Role permission sets: replace semantics and cache invalidation.

use std::time::Duration;

use serde_json::json;

use backoffice_acl::Permission;
use backoffice_api::ApiError;
use backoffice_core::RecordId;
use backoffice_storage::{Order, Predicate};

use crate::common::{TestHarness, fields};

async fn catalog_ids(harness: &TestHarness, keys: &[&str]) -> Vec<RecordId> {
    let mut ids = Vec::new();
    for key in keys {
        let permission: Permission = harness
            .ctx
            .repos
            .permissions
            .find_one(&Predicate::eq("key", *key))
            .await
            .unwrap()
            .unwrap();
        ids.push(permission.id);
    }
    ids
}

#[tokio::test]
async fn test_assignment_replaces_the_whole_set() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    let handlers = harness.roles();

    let initial = catalog_ids(&harness, &["users:read:any", "users:delete:any", "roles:read:any"]).await;
    let created = handlers
        .create(&admin, fields(json!({ "name": "Ops", "permission_ids": initial })))
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let replacement = catalog_ids(&harness, &["calculate:read:any", "users:read:any"]).await;
    handlers
        .update(&admin, &id, fields(json!({ "permission_ids": [replacement[0], replacement[1], replacement[0]] })))
        .await
        .unwrap();

    let stored = handlers.get(&admin, &id).await.unwrap();
    let mut got: Vec<RecordId> = stored["permission_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().parse().unwrap())
        .collect();
    got.sort();
    let mut expected = replacement.clone();
    expected.sort();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_role_edit_takes_effect_on_next_resolution() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    let user = harness.user().await;
    assert!(!user.permissions.iter().any(|k| k.to_string() == "roles:read:any"));

    let user_role = harness
        .ctx
        .repos
        .roles
        .find_one(&Predicate::eq("name", "User"))
        .await
        .unwrap()
        .unwrap();
    let mut grants = user_role.permission_ids.clone();
    grants.extend(catalog_ids(&harness, &["roles:read:any"]).await);

    harness
        .roles()
        .update(
            &admin,
            &user_role.id.to_string(),
            fields(json!({ "permission_ids": grants })),
        )
        .await
        .unwrap();

    let refreshed = harness.ctx.identity.resolve(user.id).await.unwrap();
    assert!(refreshed.permissions.iter().any(|k| k.to_string() == "roles:read:any"));
}

#[tokio::test]
async fn test_assigned_permission_cannot_be_deleted() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    let handlers = harness.permissions();

    let assigned = catalog_ids(&harness, &["users:read:own"]).await[0];
    let result = handlers.delete(&admin, &assigned.to_string()).await;
    assert!(matches!(result, Err(ApiError::Conflict(_))));

    let created = handlers
        .create(
            &admin,
            fields(json!({ "resource": "reports", "action": "read", "scope": "any", "key": "forged" })),
        )
        .await
        .unwrap();
    assert_eq!(created["key"], "reports:read:any");

    let id = created["id"].as_str().unwrap().to_string();
    handlers.delete(&admin, &id).await.unwrap();

    let remaining = harness
        .ctx
        .repos
        .permissions
        .find(&Predicate::All, Order::default())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 50);
}

#[tokio::test]
async fn test_unknown_ids_are_rejected_on_both_sides() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;

    let ghost = harness
        .roles()
        .create(
            &admin,
            fields(json!({ "name": "Ghost", "permission_ids": [RecordId::new()] })),
        )
        .await;
    assert!(matches!(ghost, Err(ApiError::Validation(_))));
    assert!(
        harness
            .ctx
            .repos
            .roles
            .find_one(&Predicate::eq("name", "Ghost"))
            .await
            .unwrap()
            .is_none()
    );

    let user = harness.user().await;
    let dangling = harness
        .users()
        .update(
            &admin,
            &user.id.to_string(),
            fields(json!({ "role_ids": [RecordId::new()] })),
        )
        .await;
    assert!(matches!(dangling, Err(ApiError::Validation(_))));
    assert_eq!(harness.user().await.roles, vec!["User"]);
}

#[tokio::test]
async fn test_assigned_permission_cannot_be_rewritten() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    let handlers = harness.permissions();
    let held = catalog_ids(&harness, &["calculate:read:own"]).await[0];

    let rewrite = handlers
        .update(
            &admin,
            &held.to_string(),
            fields(json!({ "resource": "reports", "scope": "any" })),
        )
        .await;
    assert!(matches!(rewrite, Err(ApiError::Conflict(_))));

    let user = harness.ctx.identity.resolve(harness.user().await.id).await.unwrap();
    let keys: Vec<String> = user.permissions.iter().map(ToString::to_string).collect();
    assert!(keys.iter().any(|k| k == "calculate:read:own"));
    assert!(!keys.iter().any(|k| k == "reports:read:any"));

    let reworded = handlers
        .update(
            &admin,
            &held.to_string(),
            fields(json!({ "description": "Read own calculations" })),
        )
        .await
        .unwrap();
    assert_eq!(reworded["key"], "calculate:read:own");
    assert_eq!(reworded["description"], "Read own calculations");
}

#[tokio::test]
async fn test_unassigned_permission_rewrite_refreshes_description() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    let handlers = harness.permissions();

    let created = handlers
        .create(
            &admin,
            fields(json!({ "resource": "reports", "action": "read", "scope": "own" })),
        )
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let moved = handlers
        .update(&admin, &id, fields(json!({ "scope": "any" })))
        .await
        .unwrap();
    assert_eq!(moved["key"], "reports:read:any");
    assert_eq!(moved["description"], "Allow to read reports (any)");
}

#[tokio::test]
async fn test_permission_delete_waits_for_catalog_writes() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    let created = harness
        .permissions()
        .create(
            &admin,
            fields(json!({ "resource": "reports", "action": "read", "scope": "any" })),
        )
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let held = harness.ctx.catalog_writes.clone().lock_owned().await;
    let handlers = harness.permissions();
    let pending = tokio::spawn(async move { handlers.delete(&admin, &id).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished());
    assert_eq!(
        harness.ctx.repos.permissions.count(&Predicate::All).await.unwrap(),
        51
    );

    drop(held);
    pending.await.unwrap().unwrap();
    assert_eq!(
        harness.ctx.repos.permissions.count(&Predicate::All).await.unwrap(),
        50
    );
}
