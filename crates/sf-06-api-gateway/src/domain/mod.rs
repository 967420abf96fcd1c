//! Domain layer for the API Gateway.

pub mod config;
pub mod cookie;
pub mod error;
pub mod payload;

pub use config::{ConfigError, StorefrontConfig};
pub use cookie::SessionCookie;
pub use error::{ApiError, ApiResult, GatewayError};
pub use payload::{CartForm, Payload};
