//! Common test utilities and harness for backoffice-api integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use backoffice_acl::{Permission, PermissionKey, PermissionSet, Principal, Role, User};
use backoffice_api::resources::{permissions, roles, users};
use backoffice_api::seed::{DEMO_ADMIN, DEMO_USER, bootstrap};
use backoffice_api::{AppContext, Config, Repositories, ResourceHandlers, router};
use backoffice_core::PrincipalId;
use backoffice_storage::{Patch, Predicate};

/// Secret used to sign tokens in tests.
pub const TEST_SECRET: &str = "integration-test-secret";

/// A seeded application: catalog, Admin/User roles and both demo accounts.
pub struct TestHarness {
    /// The shared context.
    pub ctx: AppContext,
}

impl TestHarness {
    /// Build and seed a fresh in-memory application.
    pub async fn seeded() -> Self {
        let mut config = Config::default();
        config.auth.jwt_secret = TEST_SECRET.to_string();
        let ctx = AppContext::new(config, Repositories::in_memory()).unwrap();
        bootstrap(&ctx).await.unwrap();
        Self { ctx }
    }

    /// The full router over this harness' context.
    pub fn app(&self) -> Router {
        router(self.ctx.clone())
    }

    /// Resolve the account registered under `email`.
    pub async fn principal(&self, email: &str) -> Principal {
        let user = self
            .ctx
            .repos
            .users
            .find_one(&Predicate::eq("email", email))
            .await
            .unwrap()
            .expect("account exists");
        self.ctx.identity.resolve(user.principal_id()).await.unwrap()
    }

    /// The demo administrator.
    pub async fn admin(&self) -> Principal {
        self.principal(DEMO_ADMIN.email).await
    }

    /// The demo standard account.
    pub async fn user(&self) -> Principal {
        self.principal(DEMO_USER.email).await
    }

    /// `users` handlers over the harness stores and hooks.
    pub fn users(&self) -> ResourceHandlers<User> {
        let ctx = &self.ctx;
        ResourceHandlers::new(
            users::spec(ctx.repos.roles.clone()),
            ctx.repos.users.clone(),
            ctx.hooks.clone(),
        )
    }

    /// `roles` handlers over the harness stores and hooks.
    pub fn roles(&self) -> ResourceHandlers<Role> {
        let ctx = &self.ctx;
        ResourceHandlers::new(
            roles::spec(ctx.repos.permissions.clone(), ctx.catalog_writes.clone()),
            ctx.repos.roles.clone(),
            ctx.hooks.clone(),
        )
    }

    /// `permissions` handlers over the harness stores and hooks.
    pub fn permissions(&self) -> ResourceHandlers<Permission> {
        let ctx = &self.ctx;
        ResourceHandlers::new(
            permissions::spec(ctx.repos.roles.clone(), ctx.catalog_writes.clone()),
            ctx.repos.permissions.clone(),
            ctx.hooks.clone(),
        )
    }

    /// A valid bearer token for `principal`.
    pub fn token(&self, principal: &Principal) -> String {
        self.ctx
            .issuer
            .issue(principal.id, &principal.email)
            .unwrap()
            .token
    }

    /// Send one request through the router; returns status and JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

/// A principal holding exactly `keys`, without any stored account.
pub fn principal_with(keys: &[&str]) -> Principal {
    let id = PrincipalId::new();
    Principal {
        id,
        email: format!("{id}@example.com"),
        name: "Test Principal".to_string(),
        roles: vec![],
        permissions: keys
            .iter()
            .map(|k| k.parse::<PermissionKey>().unwrap())
            .collect::<PermissionSet>(),
    }
}

/// The object inside `value` as a payload.
pub fn fields(value: Value) -> Patch {
    match value {
        Value::Object(fields) => fields,
        other => panic!("expected a JSON object, got {other}"),
    }
}
