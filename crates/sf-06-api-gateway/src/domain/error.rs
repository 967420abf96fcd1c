//! API error type and its HTTP mapping.
//!
//! | Kind                   | Status | Body                                  |
//! |------------------------|--------|---------------------------------------|
//! | `InvalidInput`         | 400    | `message` + per-field `errors` map    |
//! | `ForgeryTokenMismatch` | 403    | fixed message                         |
//! | `NotFound`             | 404    | `message`                             |
//! | rate limited           | 429    | `retry_after_ms`, `Retry-After`       |
//! | `StorageUnavailable`   | 503    | generic message, detail only in logs  |

use crate::domain::config::ConfigError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sf_02_forgery_guard::ForgeryError;
use sf_01_session_identity::SessionError;
use sf_04_cart_service::CartError;
use sf_05_catalog::CatalogError;
use shared_types::{ErrorKind, FieldErrors};
use std::fmt;

/// Machine-readable error codes
pub mod codes {
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const FORGERY_TOKEN_MISMATCH: &str = "forgery_token_mismatch";
    pub const NOT_FOUND: &str = "not_found";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const STORAGE_UNAVAILABLE: &str = "storage_unavailable";
    pub const INTERNAL: &str = "internal";
}

/// Error returned by every storefront endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    /// Field report for invalid input.
    pub errors: Option<FieldErrors>,
    /// Next forgery token, when the failing request consumed the previous one.
    pub csrf_token: Option<String>,
    pub retry_after_ms: Option<u64>,
}

#[derive(Serialize)]
struct ApiErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    csrf_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_ms: Option<u64>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            errors: None,
            csrf_token: None,
            retry_after_ms: None,
        }
    }

    /// Malformed request without a field report.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_INPUT, message)
    }

    /// Body that could not be read or decoded, keeping the extractor's status.
    pub fn rejected_body(status: StatusCode, message: impl Into<String>) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(status, codes::PAYLOAD_TOO_LARGE, message)
        } else {
            Self::bad_request(message)
        }
    }

    /// Field-level validation failure.
    pub fn invalid_input(errors: FieldErrors) -> Self {
        let mut error = Self::bad_request("Please correct the highlighted fields");
        error.errors = Some(errors);
        error
    }

    pub fn forgery_mismatch() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::FORGERY_TOKEN_MISMATCH,
            "Invalid or missing forgery token",
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }

    pub fn rate_limited(retry_after_ms: u64) -> Self {
        let mut error = Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            codes::RATE_LIMITED,
            "Rate limit exceeded",
        );
        error.retry_after_ms = Some(retry_after_ms);
        error
    }

    /// The detail is logged, never returned.
    pub fn storage_unavailable(detail: &dyn fmt::Display) -> Self {
        tracing::error!(error = %detail, "[sf-06] storage unavailable");
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::STORAGE_UNAVAILABLE,
            "Service temporarily unavailable",
        )
    }

    pub fn internal(detail: &dyn fmt::Display) -> Self {
        tracing::error!(error = %detail, "[sf-06] internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Internal server error",
        )
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    fn from_kind(
        kind: ErrorKind,
        detail: &dyn fmt::Display,
        errors: Option<&FieldErrors>,
    ) -> Self {
        match kind {
            ErrorKind::InvalidInput => match errors {
                Some(errors) => Self::invalid_input(errors.clone()),
                None => Self::bad_request(detail.to_string()),
            },
            ErrorKind::NotFound => Self::not_found(detail.to_string()),
            ErrorKind::ForgeryTokenMismatch => Self::forgery_mismatch(),
            ErrorKind::StorageUnavailable => Self::storage_unavailable(detail),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.code,
            message: &self.message,
            errors: self.errors.as_ref(),
            csrf_token: self.csrf_token.as_deref(),
            retry_after_ms: self.retry_after_ms,
        };
        let mut response = (self.status, Json(body)).into_response();

        if let Some(ms) = self.retry_after_ms {
            if let Ok(value) = HeaderValue::from_str(&ms.div_ceil(1000).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

// Conversions from subsystem errors

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        Self::from_kind(err.kind(), &err, err.field_errors())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let errors = match &err {
            CatalogError::InvalidInput(errors) => Some(errors),
            _ => None,
        };
        Self::from_kind(err.kind(), &err, errors)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::from_kind(err.kind(), &err, None)
    }
}

impl From<ForgeryError> for ApiError {
    fn from(err: ForgeryError) -> Self {
        Self::from_kind(err.kind(), &err, None)
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving, not per request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server failed while running
    #[error("server error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{KVStoreError, ProductId};

    #[tokio::test]
    async fn test_invalid_input_carries_field_map() {
        let mut fields = FieldErrors::new();
        fields.insert("product_id", "Valid product ID is required");
        fields.insert("quantity", "Valid quantity is required");
        let response = ApiError::from(CartError::InvalidInput(fields)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid_input");
        assert_eq!(body["errors"]["product_id"], "Valid product ID is required");
        assert_eq!(body["errors"]["quantity"], "Valid quantity is required");
    }

    #[test]
    fn test_kind_to_status() {
        let not_found = CartError::ProductNotFound {
            product_id: ProductId::new(7).unwrap(),
        };
        assert_eq!(ApiError::from(not_found).status, StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ForgeryError::Mismatch).status,
            StatusCode::FORBIDDEN
        );
        let down = KVStoreError::Unavailable {
            message: "disk gone".into(),
        };
        let err = ApiError::from(SessionError::Storage(down));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message.contains("disk gone"));
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::rate_limited(1_500).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }
}
