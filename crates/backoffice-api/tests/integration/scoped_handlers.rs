//! Scope enforcement by the generic handler factory.

use std::sync::Arc;

use serde_json::json;

use backoffice_acl::catalog::seed_catalog;
use backoffice_acl::{Permission, Principal, Role, Scope, User};
use backoffice_api::hooks::HookSet;
use backoffice_api::resources::calculations::{self, Calculation};
use backoffice_api::resources::roles;
use backoffice_api::resource::WriteLock;
use backoffice_api::{ApiError, Operation, ResourceHandlers};
use backoffice_core::{PrincipalId, RecordId};
use backoffice_storage::spy::SpyRepository;
use backoffice_storage::{MemoryRepository, Order, Predicate, Repository};

use crate::common::{TestHarness, fields, principal_with};

fn calculation_input() -> serde_json::Value {
    json!({ "ad_spend": 1000, "cost_per_result": 10, "average_order_value": 25 })
}

async fn store_calculation(repo: &dyn Repository<Calculation>, owner: PrincipalId) -> Calculation {
    let mut payload = fields(calculation_input());
    payload.insert("user_id".into(), json!(owner));
    repo.save(repo.create(payload).unwrap()).await.unwrap()
}

fn calculation_handlers(repo: Arc<dyn Repository<Calculation>>) -> ResourceHandlers<Calculation> {
    ResourceHandlers::new(calculations::spec(), repo, HookSet::default())
}

fn owner_of(value: &serde_json::Value) -> String {
    value["user_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_any_grant_wins_when_both_are_held() {
    let repo = Arc::new(MemoryRepository::<Calculation>::new());
    let handlers = calculation_handlers(repo.clone());
    let caller = principal_with(&["calculate:read:any", "calculate:read:own"]);

    store_calculation(repo.as_ref(), caller.id).await;
    store_calculation(repo.as_ref(), PrincipalId::new()).await;

    let grant = handlers.authorize(&caller, Operation::List).unwrap();
    assert_eq!(grant.scope(), Scope::Any);
    assert_eq!(grant.filter(), &Predicate::All);
    assert_eq!(handlers.list(&caller).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_own_list_returns_exactly_the_callers_records() {
    let repo = Arc::new(MemoryRepository::<Calculation>::new());
    let handlers = calculation_handlers(repo.clone());
    let caller = principal_with(&["calculate:read:own"]);
    let other = PrincipalId::new();

    let mut mine = Vec::new();
    for _ in 0..3 {
        mine.push(store_calculation(repo.as_ref(), caller.id).await.id);
    }
    for _ in 0..4 {
        store_calculation(repo.as_ref(), other).await;
    }

    let listed = handlers.list(&caller).await.unwrap();
    assert_eq!(listed.len(), 3);
    for record in &listed {
        assert_eq!(owner_of(record), caller.id.to_string());
        let id: RecordId = record["id"].as_str().unwrap().parse().unwrap();
        assert!(mine.contains(&id));
    }
}

#[tokio::test]
async fn test_missing_grant_is_forbidden_before_any_repository_call() {
    let inner = Arc::new(MemoryRepository::<Calculation>::new());
    let existing = store_calculation(inner.as_ref(), PrincipalId::new()).await;
    let spy = Arc::new(SpyRepository::new(inner));
    let handlers = calculation_handlers(spy.clone());
    let caller = principal_with(&["users:read:any", "dashboard:read:own"]);
    let id = existing.id.to_string();

    let results = [
        handlers.list(&caller).await.map(|_| ()),
        handlers
            .create(&caller, fields(calculation_input()))
            .await
            .map(|_| ()),
        handlers.get(&caller, &id).await.map(|_| ()),
        handlers
            .update(&caller, &id, fields(json!({ "ad_spend": 5 })))
            .await
            .map(|_| ()),
        handlers.delete(&caller, &id).await.map(|_| ()),
    ];
    for result in results {
        assert!(matches!(result, Err(ApiError::Forbidden(_))), "{result:?}");
    }
    assert_eq!(spy.call_count(), 0, "calls: {:?}", spy.calls());
}

#[tokio::test]
async fn test_foreign_record_is_not_found_under_own_scope() {
    let repo = Arc::new(MemoryRepository::<Calculation>::new());
    let handlers = calculation_handlers(repo.clone());
    let caller = principal_with(&[
        "calculate:read:own",
        "calculate:update:own",
        "calculate:delete:own",
    ]);
    let foreign = store_calculation(repo.as_ref(), PrincipalId::new()).await;
    let id = foreign.id.to_string();

    assert!(matches!(handlers.get(&caller, &id).await, Err(ApiError::NotFound)));
    assert!(matches!(
        handlers.update(&caller, &id, fields(json!({ "ad_spend": 1 }))).await,
        Err(ApiError::NotFound)
    ));
    assert!(matches!(handlers.delete(&caller, &id).await, Err(ApiError::NotFound)));

    // A missing id looks exactly the same.
    let missing = RecordId::new().to_string();
    assert!(matches!(handlers.get(&caller, &missing).await, Err(ApiError::NotFound)));

    let untouched = repo.find_one(&Predicate::id(foreign.id)).await.unwrap().unwrap();
    assert_eq!(untouched, foreign);
}

#[tokio::test]
async fn test_create_overwrites_a_forged_owner() {
    let repo = Arc::new(MemoryRepository::<Calculation>::new());
    let handlers = calculation_handlers(repo.clone());
    let attacker_target = PrincipalId::new();

    for scope in ["any", "own"] {
        let key = format!("calculate:create:{scope}");
        let caller = principal_with(&[key.as_str()]);
        let mut payload = fields(calculation_input());
        payload.insert("user_id".into(), json!(attacker_target));
        payload.insert("user".into(), json!({ "id": attacker_target }));

        let created = handlers.create(&caller, payload).await.unwrap();
        assert_eq!(owner_of(&created), caller.id.to_string());

        let id: RecordId = created["id"].as_str().unwrap().parse().unwrap();
        let stored = repo.find_one(&Predicate::id(id)).await.unwrap().unwrap();
        assert_eq!(stored.user_id, caller.id);
    }
}

#[tokio::test]
async fn test_update_cannot_move_ownership() {
    let repo = Arc::new(MemoryRepository::<Calculation>::new());
    let handlers = calculation_handlers(repo.clone());
    let owner = PrincipalId::new();
    let record = store_calculation(repo.as_ref(), owner).await;
    let elsewhere = PrincipalId::new();

    let admin = principal_with(&["calculate:update:any"]);
    let updated = handlers
        .update(
            &admin,
            &record.id.to_string(),
            fields(json!({ "user_id": elsewhere, "average_order_value": 5 })),
        )
        .await
        .unwrap();
    assert_eq!(owner_of(&updated), owner.to_string());
    assert_eq!(updated["total_revenue"], json!(500.0));
}

#[tokio::test]
async fn test_create_only_grant_scenario() {
    let permissions = Arc::new(MemoryRepository::<Permission>::new());
    seed_catalog(permissions.as_ref(), &["calculate"]).await.unwrap();
    let create_own = permissions
        .find_one(&Predicate::eq("key", "calculate:create:own"))
        .await
        .unwrap()
        .unwrap();

    let roles_repo = Arc::new(MemoryRepository::<Role>::new());
    let role = roles_repo
        .save(
            roles_repo
                .create(fields(json!({ "name": "User", "permission_ids": [create_own.id] })))
                .unwrap(),
        )
        .await
        .unwrap();

    let users_repo = Arc::new(MemoryRepository::<User>::new());
    let account = users_repo
        .save(
            users_repo
                .create(fields(json!({
                    "email": "calc@example.com",
                    "name": "Calc",
                    "role_ids": [role.id],
                })))
                .unwrap(),
        )
        .await
        .unwrap();

    let identity = backoffice_acl::IdentityResolver::new(
        users_repo,
        roles_repo,
        permissions,
        std::time::Duration::ZERO,
    );
    let caller = identity.resolve(account.principal_id()).await.unwrap();

    let repo = Arc::new(MemoryRepository::<Calculation>::new());
    let handlers = calculation_handlers(repo.clone());
    let created = handlers
        .create(&caller, fields(calculation_input()))
        .await
        .unwrap();
    assert_eq!(owner_of(&created), caller.id.to_string());

    assert!(matches!(handlers.list(&caller).await, Err(ApiError::Forbidden(_))));
}

#[tokio::test]
async fn test_admin_lists_every_account() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    let handlers = harness.users();

    let grant = handlers.authorize(&admin, Operation::List).unwrap();
    assert_eq!(grant.scope(), Scope::Any);

    let listed = handlers.list(&admin).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn test_own_account_scope() {
    let harness = TestHarness::seeded().await;
    let user = harness.user().await;
    let admin = harness.admin().await;
    let handlers = harness.users();

    let listed = handlers.list(&user).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], json!(user.id));

    assert!(matches!(
        handlers.get(&user, &admin.id.to_string()).await,
        Err(ApiError::NotFound)
    ));

    // Self-service edits cannot grant roles.
    let admin_role = harness
        .ctx
        .repos
        .roles
        .find_one(&Predicate::eq("name", "Admin"))
        .await
        .unwrap()
        .unwrap();
    let updated = handlers
        .update(
            &user,
            &user.id.to_string(),
            fields(json!({ "name": "Renamed", "role_ids": [admin_role.id] })),
        )
        .await
        .unwrap();
    assert_eq!(updated["name"], "Renamed");
    assert!(!updated["role_ids"]
        .as_array()
        .unwrap()
        .contains(&json!(admin_role.id)));

    // Creating another account needs `users:create:any`.
    let only_own = principal_with(&["users:create:own"]);
    assert!(matches!(
        handlers
            .create(
                &only_own,
                fields(json!({ "email": "x@example.com", "name": "X", "password": "pw" })),
            )
            .await,
        Err(ApiError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_unowned_resource_rejects_own_grant_without_repository_access() {
    let spy = Arc::new(SpyRepository::new(Arc::new(MemoryRepository::<Role>::new())));
    let spec = roles::spec(
        Arc::new(MemoryRepository::<Permission>::new()),
        WriteLock::default(),
    );
    let handlers = ResourceHandlers::new(spec, spy.clone(), HookSet::default());
    let caller = principal_with(&["roles:read:own", "roles:create:own"]);

    assert!(matches!(handlers.list(&caller).await, Err(ApiError::Forbidden(_))));
    assert!(matches!(
        handlers.create(&caller, fields(json!({ "name": "Sneaky" }))).await,
        Err(ApiError::Forbidden(_))
    ));
    assert_eq!(spy.call_count(), 0);
}

#[tokio::test]
async fn test_scope_resolution_never_falls_through() {
    let handlers = calculation_handlers(Arc::new(MemoryRepository::<Calculation>::new()));
    let cases: [(&[&str], Option<Scope>); 4] = [
        (&["calculate:read:any"], Some(Scope::Any)),
        (&["calculate:read:own"], Some(Scope::Own)),
        (&["calculate:read:any", "calculate:read:own"], Some(Scope::Any)),
        (&["calculate:create:any"], None),
    ];
    for (keys, expected) in cases {
        let caller: Principal = principal_with(keys);
        let scope = handlers.authorize(&caller, Operation::Get).ok().map(|g| g.scope());
        assert_eq!(scope, expected, "keys {keys:?}");
    }
}

#[tokio::test]
async fn test_mutations_of_audited_kinds_are_recorded() {
    let harness = TestHarness::seeded().await;
    let admin = harness.admin().await;
    let ctx = &harness.ctx;
    let users = harness.users();
    let calcs = ResourceHandlers::new(
        calculations::spec(),
        ctx.repos.calculations.clone(),
        ctx.hooks.clone(),
    );

    let created = users
        .create(
            &admin,
            fields(json!({ "email": "new@example.com", "name": "New", "password": "pw-123" })),
        )
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    users
        .update(&admin, &id, fields(json!({ "name": "Newer" })))
        .await
        .unwrap();
    users.delete(&admin, &id).await.unwrap();
    calcs
        .create(&admin, fields(calculation_input()))
        .await
        .unwrap();

    let trail = ctx
        .repos
        .audit
        .find(&Predicate::eq("entity_id", id.as_str()), Order::OldestFirst)
        .await
        .unwrap();
    let actions: Vec<String> = trail.iter().map(|r| r.action.to_string()).collect();
    assert_eq!(actions, ["CREATE", "UPDATE", "DELETE"]);
    assert!(trail.iter().all(|r| r.actor_id == Some(admin.id)));
    assert!(
        ctx.repos
            .audit
            .find_one(&Predicate::eq("entity_name", "Calculation"))
            .await
            .unwrap()
            .is_none()
    );
}
