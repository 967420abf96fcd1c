//! Storefront configuration with validation.
//!
//! One document covers the HTTP surface and every subsystem behind it, so
//! the runtime can load it once and hand each section to its owner.

use serde::{Deserialize, Serialize};
use sf_01_session_identity::SessionPolicy;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Main storefront configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Session identity and cookie configuration
    pub session: SessionConfig,
    /// Cart limits and retention
    pub cart: CartConfig,
    /// Catalog listing configuration
    pub catalog: CatalogConfig,
    /// Per-IP rate limiting of mutations
    pub rate_limit: RateLimitConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Durable storage configuration
    pub storage: StorageConfig,
    /// Background maintenance configuration
    pub maintenance: MaintenanceConfig,
}

impl StorefrontConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Invalid(format!(
                "cookie name {:?} is not a valid cookie token",
                self.session.cookie_name
            )));
        }

        if self.session.idle_ttl.is_zero() || self.session.regeneration_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "session intervals cannot be 0".into(),
            ));
        }

        if self.session.regeneration_interval >= self.session.idle_ttl {
            return Err(ConfigError::InvalidTimeout(
                "regeneration_interval must be shorter than idle_ttl".into(),
            ));
        }

        if self.session.retired_ttl < self.session.idle_ttl {
            return Err(ConfigError::InvalidTimeout(
                "retired_ttl cannot be shorter than idle_ttl".into(),
            ));
        }

        if self.cart.max_quantity_per_request == 0 || self.cart.max_line_quantity == 0 {
            return Err(ConfigError::InvalidLimit(
                "cart quantity limits cannot be 0".into(),
            ));
        }

        if self.cart.max_quantity_per_request > self.cart.max_line_quantity {
            return Err(ConfigError::InvalidLimit(
                "max_quantity_per_request cannot exceed max_line_quantity".into(),
            ));
        }

        if matches!(self.cart.abandoned_retention, Some(d) if d.is_zero()) {
            return Err(ConfigError::InvalidTimeout(
                "abandoned_retention cannot be 0".into(),
            ));
        }

        if self.catalog.page_size == 0 {
            return Err(ConfigError::InvalidLimit("page_size cannot be 0".into()));
        }

        if self.rate_limit.enabled && self.rate_limit.mutations_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "mutations_per_second cannot be 0".into(),
            ));
        }

        if self.limits.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit("max_body_size cannot be 0".into()));
        }

        if self.maintenance.purge_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "purge_interval cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie
    pub cookie_name: String,
    /// Idle time after which a session is treated as absent
    #[serde(with = "humantime_serde")]
    pub idle_ttl: Duration,
    /// Age after which the identifier is rotated
    #[serde(with = "humantime_serde")]
    pub regeneration_interval: Duration,
    /// How long a retired identifier stays blocked from reissue
    #[serde(with = "humantime_serde")]
    pub retired_ttl: Duration,
    /// Mark the cookie `Secure`. Disable only for local plain-HTTP development.
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let policy = SessionPolicy::default();
        Self {
            cookie_name: "sf_session".to_string(),
            idle_ttl: policy.idle_ttl,
            regeneration_interval: policy.regeneration_interval,
            retired_ttl: policy.retired_ttl,
            cookie_secure: true,
        }
    }
}

impl SessionConfig {
    pub fn policy(&self) -> SessionPolicy {
        SessionPolicy {
            idle_ttl: self.idle_ttl,
            regeneration_interval: self.regeneration_interval,
            retired_ttl: self.retired_ttl,
        }
    }
}

/// Cart configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Largest quantity a single add request may carry
    pub max_quantity_per_request: u32,
    /// Saturation point of a line's quantity
    pub max_line_quantity: u32,
    /// Age after which lines of dead sessions are purged. `None` keeps them.
    #[serde(with = "humantime_serde::option")]
    pub abandoned_retention: Option<Duration>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            max_quantity_per_request: sf_04_cart_service::MAX_QUANTITY_PER_REQUEST,
            max_line_quantity: 9_999,
            abandoned_retention: None,
        }
    }
}

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Products per listing page
    pub page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: sf_05_catalog::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Rate limiting configuration. Only state-changing requests are limited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Mutations per second per IP
    pub mutations_per_second: u32,
    /// Burst allowance (token bucket)
    pub burst_size: u32,
    /// Enable rate limiting
    pub enabled: bool,
    /// IPs exempt from rate limiting
    pub whitelist: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            mutations_per_second: 10,
            burst_size: 20,
            enabled: true,
            whitelist: Vec::new(),
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 64KiB)
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
        }
    }
}

/// CORS configuration. Disabled means no CORS headers at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            allowed_methods: vec!["GET".to_string(), "POST".to_string()],
            allowed_headers: vec!["Content-Type".to_string(), "X-CSRF-Token".to_string()],
            max_age: 3600,
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the database and its process lock
    pub data_dir: PathBuf,
    /// fsync every committed batch
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
        }
    }
}

/// Background maintenance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// How often expired sessions (and abandoned carts, when enabled) are purged
    #[serde(with = "humantime_serde")]
    pub purge_interval: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            purge_interval: Duration::from_secs(300),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Port 0 configured
    #[error("invalid port")]
    InvalidPort,
    /// Invalid rate limiting configuration
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout or interval
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Parse `"500ms"`, `"10s"`, `"30m"`, `"1h"`, `"7d"` or plain seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let invalid = || ConfigError::Invalid(format!("invalid duration {:?}", s));
    let (digits, scale_ms): (&str, u64) = if let Some(v) = s.strip_suffix("ms") {
        (v, 1)
    } else if let Some(v) = s.strip_suffix('s') {
        (v, 1_000)
    } else if let Some(v) = s.strip_suffix('m') {
        (v, 60_000)
    } else if let Some(v) = s.strip_suffix('h') {
        (v, 3_600_000)
    } else if let Some(v) = s.strip_suffix('d') {
        (v, 86_400_000)
    } else {
        (s, 1_000)
    };
    let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
    amount
        .checked_mul(scale_ms)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}

/// Shortest exact rendering accepted by [`parse_duration`].
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    for (unit, scale) in [("d", 86_400_000), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)] {
        if ms != 0 && ms % scale == 0 {
            return format!("{}{}", ms / scale, unit);
        }
    }
    format!("{}ms", ms)
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| super::super::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
