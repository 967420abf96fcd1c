//! # Configuration Loading
//!
//! Layered, later wins:
//!
//! 1. [`StorefrontConfig::default`]
//! 2. JSON file named by `SF_CONFIG` (sections may be partial)
//! 3. Environment overrides
//!
//! | Variable                   | Field                          |
//! |----------------------------|--------------------------------|
//! | `SF_HTTP_HOST`             | `http.host`                    |
//! | `SF_HTTP_PORT`             | `http.port`                    |
//! | `SF_DATA_DIR`              | `storage.data_dir`             |
//! | `SF_SESSION_COOKIE_SECURE` | `session.cookie_secure`        |
//! | `SF_CART_RETENTION`        | `cart.abandoned_retention`     |
//! | `SF_RATE_LIMIT_ENABLED`    | `rate_limit.enabled`           |
//!
//! The result is validated before it is returned. A malformed value is an
//! error, never silently ignored.

use crate::error::{RuntimeError, RuntimeResult};
use sf_06_api_gateway::domain::config::parse_duration;
use sf_06_api_gateway::StorefrontConfig;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_CONFIG: &str = "SF_CONFIG";
pub const ENV_HTTP_HOST: &str = "SF_HTTP_HOST";
pub const ENV_HTTP_PORT: &str = "SF_HTTP_PORT";
pub const ENV_DATA_DIR: &str = "SF_DATA_DIR";
pub const ENV_COOKIE_SECURE: &str = "SF_SESSION_COOKIE_SECURE";
pub const ENV_CART_RETENTION: &str = "SF_CART_RETENTION";
pub const ENV_RATE_LIMIT_ENABLED: &str = "SF_RATE_LIMIT_ENABLED";

/// Load configuration from the process environment.
pub fn load_config() -> RuntimeResult<StorefrontConfig> {
    load_config_from(|name| std::env::var(name).ok())
}

/// Load configuration reading variables through `env`.
pub fn load_config_from(env: impl Fn(&str) -> Option<String>) -> RuntimeResult<StorefrontConfig> {
    let mut config = match env(ENV_CONFIG).filter(|p| !p.trim().is_empty()) {
        Some(path) => read_config_file(Path::new(path.trim()))?,
        None => StorefrontConfig::default(),
    };

    if let Some(host) = env(ENV_HTTP_HOST) {
        config.http.host = parse_var(ENV_HTTP_HOST, &host)?;
    }
    if let Some(port) = env(ENV_HTTP_PORT) {
        config.http.port = parse_var(ENV_HTTP_PORT, &port)?;
    }
    if let Some(dir) = env(ENV_DATA_DIR) {
        config.storage.data_dir = PathBuf::from(dir);
    }
    if let Some(secure) = env(ENV_COOKIE_SECURE) {
        config.session.cookie_secure = parse_flag(ENV_COOKIE_SECURE, &secure)?;
    }
    if let Some(retention) = env(ENV_CART_RETENTION) {
        config.cart.abandoned_retention = match retention.trim() {
            "" | "off" | "none" => None,
            raw => Some(parse_duration(raw).map_err(|e| RuntimeError::Env {
                name: ENV_CART_RETENTION,
                message: e.to_string(),
            })?),
        };
    }
    if let Some(enabled) = env(ENV_RATE_LIMIT_ENABLED) {
        config.rate_limit.enabled = parse_flag(ENV_RATE_LIMIT_ENABLED, &enabled)?;
    }

    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> RuntimeResult<StorefrontConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| RuntimeError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&raw).map_err(|source| RuntimeError::ParseFile {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "[runtime] configuration file loaded");
    Ok(config)
}

fn parse_var<T>(name: &'static str, raw: &str) -> RuntimeResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| RuntimeError::Env {
        name,
        message: format!("{:?}: {}", raw, e),
    })
}

fn parse_flag(name: &'static str, raw: &str) -> RuntimeResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RuntimeError::Env {
            name,
            message: format!("expected a boolean, got {:?}", other),
        }),
    }
}
