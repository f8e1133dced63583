//! `serve` and `catalog`.

use backoffice_acl::catalog::{DEFAULT_RESOURCES, catalog_keys};
use backoffice_api::{AppContext, Config, Repositories, Server};

use crate::cli::Args;
use crate::error::Result;

/// Apply command-line and environment overrides to `config`.
pub fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(secret) = &args.jwt_secret {
        config.auth.jwt_secret = secret.clone();
    }
}

/// Build the context over in-memory stores and serve until ctrl-c.
pub async fn serve(config: Config) -> Result<()> {
    tracing::info!(
        bind = %config.server.bind,
        seed = config.seed.enabled,
        "starting backoffice server"
    );
    let ctx = AppContext::new(config, Repositories::in_memory())?;
    Server::new(ctx).run().await?;
    Ok(())
}

/// The catalog keys for `resources`, or for the built-in set when empty.
pub fn catalog(resources: &[String]) -> Result<Vec<String>> {
    let resources: Vec<&str> = if resources.is_empty() {
        DEFAULT_RESOURCES.to_vec()
    } else {
        resources.iter().map(String::as_str).collect()
    };
    Ok(catalog_keys(&resources)?
        .iter()
        .map(ToString::to_string)
        .collect())
}
