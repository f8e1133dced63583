//! Router assembly and the HTTP server.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use backoffice_auth::AuthLayer;

use crate::context::AppContext;
use crate::factory::ResourceHandlers;
use crate::resources::{calculations, permissions, roles, users};
use crate::{ApiError, Result, routes, seed};

/// The full application router over `ctx`.
///
/// `/health`, `/auth/register` and `/auth/token` are public; everything else
/// sits behind the bearer-token layer.
pub fn router(ctx: AppContext) -> Router {
    let repos = &ctx.repos;
    let hooks = &ctx.hooks;

    let calculations = Arc::new(ResourceHandlers::new(
        calculations::spec(),
        repos.calculations.clone(),
        hooks.clone(),
    ));
    let users = Arc::new(ResourceHandlers::new(
        users::spec(repos.roles.clone()),
        repos.users.clone(),
        hooks.clone(),
    ));
    let roles = Arc::new(ResourceHandlers::new(
        roles::spec(repos.permissions.clone(), ctx.catalog_writes.clone()),
        repos.roles.clone(),
        hooks.clone(),
    ));
    let permissions = Arc::new(ResourceHandlers::new(
        permissions::spec(repos.roles.clone(), ctx.catalog_writes.clone()),
        repos.permissions.clone(),
        hooks.clone(),
    ));

    let auth = AuthLayer::new(ctx.validator.clone(), ctx.config.auth.auth_config());
    let protected = routes::protected()
        .merge(calculations.routes::<AppContext>())
        .merge(users.routes::<AppContext>())
        .merge(roles.routes::<AppContext>())
        .merge(permissions.routes::<AppContext>())
        .layer(auth);

    routes::public().merge(protected).with_state(ctx)
}

/// The backoffice HTTP server.
pub struct Server {
    ctx: AppContext,
}

impl Server {
    /// Server over an already built context.
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// The shared context.
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Seed, bind `server.bind` and serve until ctrl-c.
    pub async fn run(self) -> Result<()> {
        seed::bootstrap(&self.ctx).await?;

        let bind = self.ctx.config.server.bind.clone();
        let listener = TcpListener::bind(&bind)
            .await
            .map_err(|e| ApiError::internal(format!("failed to bind {bind}: {e}")))?;
        log::info!("listening on {bind}");

        axum::serve(listener, router(self.ctx))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ApiError::internal)?;
        log::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown requested");
}
