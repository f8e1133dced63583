//! Command-line arguments.

use clap::{Parser, Subcommand};

/// Backoffice - scoped access layer for admin resources
#[derive(Parser, Debug)]
#[command(name = "backoffice")]
#[command(about = "Backoffice authorization server", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "BACKOFFICE_CONFIG", global = true)]
    pub config: Option<String>,

    /// Listen address, overriding `server.bind`
    #[arg(long, env = "BACKOFFICE_BIND", global = true)]
    pub bind: Option<String>,

    /// Token signing secret, overriding `auth.jwt_secret`
    #[arg(long, env = "BACKOFFICE_JWT_SECRET", global = true, hide_env_values = true)]
    pub jwt_secret: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seed the store and run the HTTP server (default)
    Serve,
    /// Print the permission keys for the given resources
    Catalog {
        /// Resources to expand; defaults to the built-in set
        #[arg(short, long)]
        resource: Vec<String>,
    },
    /// Inspect or edit the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print the effective configuration as TOML
    Show,
    /// Get a value by dotted key, e.g. `auth.issuer`
    Get {
        /// Dotted key
        key: String,
    },
    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Target file; defaults to the platform config directory
        #[arg(short, long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
