//! Backoffice CLI
//!
//! Runs the authorization server and inspects its configuration.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config_handlers;
mod error;

use anyhow::Result;
use clap::Parser;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,backoffice=debug".into()),
        )
        .init();

    let mut args = Args::parse();
    let command = args.command.take().unwrap_or(Command::Serve);
    let config_path = args.config.as_deref();

    match command {
        Command::Serve => {
            let mut config = config_handlers::load_config(config_path)?;
            commands::apply_overrides(&mut config, &args);
            if let Err(e) = commands::serve(config).await {
                tracing::error!("server failed: {e}");
                return Err(e.into());
            }
        }
        Command::Catalog { resource } => {
            for key in commands::catalog(&resource)? {
                println!("{key}");
            }
        }
        Command::Config { action } => {
            config_handlers::handle_config_command(config_path, action)?;
        }
    }
    Ok(())
}
