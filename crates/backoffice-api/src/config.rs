//! Server configuration.
//!
//! Loaded from an optional TOML file; every section and field has a default,
//! so an empty file (or none at all) yields a runnable development setup once
//! a JWT secret is supplied.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use backoffice_auth::AuthConfig;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`Config`].
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Token signing and validation.
    pub auth: AuthSection,
    /// Permission cache.
    pub cache: CacheConfig,
    /// Audit recorder.
    pub audit: AuditConfig,
    /// Startup seeding.
    pub seed: SeedConfig,
}

/// `[server]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// `[auth]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthSection {
    /// HS256 signing secret. Required.
    pub jwt_secret: String,
    /// `iss` claim written and expected.
    pub issuer: String,
    /// Optional `aud` claim.
    pub audience: Option<String>,
    /// Lifetime of issued tokens.
    pub token_ttl_secs: u64,
    /// Tolerated clock skew.
    pub leeway_secs: u64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "backoffice".to_string(),
            audience: None,
            token_ttl_secs: 86_400,
            leeway_secs: 30,
        }
    }
}

impl AuthSection {
    /// Settings for the auth middleware.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            leeway_secs: self.leeway_secs,
        }
    }

    /// Lifetime of issued tokens.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// `[cache]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a resolved permission set may be reused. Zero disables caching.
    pub permission_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            permission_ttl_secs: 60,
        }
    }
}

impl CacheConfig {
    /// Cache lifetime.
    pub fn permission_ttl(&self) -> Duration {
        Duration::from_secs(self.permission_ttl_secs)
    }
}

/// `[audit]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// Entity kinds whose mutations are recorded.
    pub entities: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            entities: vec!["User".to_string(), "Role".to_string()],
        }
    }
}

/// `[seed]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    /// Seed the catalog and default roles on startup.
    pub enabled: bool,
    /// Also create the demo admin and user accounts.
    pub demo_accounts: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            demo_accounts: true,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must be set (or BACKOFFICE_JWT_SECRET)".to_string(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.issuer.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.issuer must not be empty".to_string()));
        }
        Ok(())
    }
}
