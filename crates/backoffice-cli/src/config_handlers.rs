//! Handler functions for config CLI commands.
//!
//! Implements the `config` subcommands (`path`, `show`, `get`, `set`, `init`)
//! over the server's [`Config`], plus TOML dotted-key helpers.

use std::path::PathBuf;

use backoffice_api::Config;

use crate::cli::ConfigAction;
use crate::error::{Error, Result};

/// Project name used for the config directory.
pub const PROJECT_NAME: &str = "backoffice";

const SECRET_MASK: &str = "********";

// ============================================================================
// Path resolution and loading
// ============================================================================

/// `<platform config dir>/backoffice/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
}

/// The explicit path if given, else the default one.
pub fn resolve_config_path(config_path: Option<&str>) -> Option<PathBuf> {
    match config_path {
        Some(path) => Some(PathBuf::from(path)),
        None => default_config_path(),
    }
}

/// Load the configuration.
///
/// An explicitly named file must exist; a missing default file yields the
/// built-in defaults.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    match resolve_config_path(config_path) {
        Some(path) if path.exists() => Ok(Config::load(Some(&path))?),
        Some(path) if config_path.is_some() => Err(Error::config(format!(
            "Config file does not exist at {}",
            path.display()
        ))),
        _ => {
            log::debug!("no config file found; using defaults");
            Ok(Config::default())
        }
    }
}

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => cmd_config_show(config_path),
        ConfigAction::Get { key } => cmd_config_get(config_path, &key),
        ConfigAction::Set { key, value } => cmd_config_set(config_path, &key, &value),
        ConfigAction::Init { file, force } => cmd_config_init(file.as_deref(), force),
    }
}

/// Show the resolved config file path.
pub fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    let path = resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist; run `{PROJECT_NAME} config init` to create it)");
    }
    Ok(())
}

/// Print the effective configuration with the signing secret masked.
pub fn cmd_config_show(config_path: Option<&str>) -> Result<()> {
    println!("{}", render_masked(&load_config(config_path)?)?);
    Ok(())
}

/// Get a configuration value by dotted key.
pub fn cmd_config_get(config_path: Option<&str>, key: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    match get_nested_value(&value, key) {
        Some(val) => {
            println!("{}", format_toml_value(val));
            Ok(())
        }
        None => Err(Error::config(format!(
            "Key '{key}' not found in configuration"
        ))),
    }
}

/// Set a configuration value by dotted key in the config file.
///
/// The edited file must still describe a valid [`Config`]; otherwise
/// nothing is written.
pub fn cmd_config_set(config_path: Option<&str>, key: &str, value: &str) -> Result<()> {
    let path = resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{PROJECT_NAME} config init` first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    set_nested_value(&mut doc, key, parse_value(value))?;

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    Config::from_toml(&toml_str)
        .map_err(|e| Error::config(format!("Refusing to write invalid config: {e}")))?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    println!("Set {key} = {value} in {}", path.display());
    Ok(())
}

/// Create a default configuration file.
pub fn cmd_config_init(file: Option<&str>, force: bool) -> Result<()> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = Config::default().to_toml()?;
    std::fs::write(&path, &toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    println!("Config file created at {}", path.display());
    println!("Set auth.jwt_secret (or BACKOFFICE_JWT_SECRET) before running `{PROJECT_NAME} serve`.");
    Ok(())
}

fn render_masked(config: &Config) -> Result<String> {
    let mut shown = config.clone();
    if !shown.auth.jwt_secret.is_empty() {
        shown.auth.jwt_secret = SECRET_MASK.to_string();
    }
    Ok(shown.to_toml()?)
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    let mut current = value;
    for part in key.split('.') {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, last) = key.rsplit_once('.').unwrap_or(("", key));
    if last.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.split('.').filter(|p| !p.is_empty()) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?;
    table.insert(last.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool → integer → float → string.
pub fn parse_value(s: &str) -> toml::Value {
    if s == "true" {
        return toml::Value::Boolean(true);
    }
    if s == "false" {
        return toml::Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

/// Format a TOML value for display on stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}
