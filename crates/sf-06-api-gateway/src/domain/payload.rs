//! Request bodies: JSON or `application/x-www-form-urlencoded`.

use crate::domain::error::ApiError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
    Form, Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sf_04_cart_service::{RawCartInput, RawField};
use shared_types::FieldErrors;

/// Form field carrying the forgery token.
pub const CSRF_FIELD: &str = "csrf_token";
/// Header accepted in place of [`CSRF_FIELD`].
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Body decoded by content type. An empty body without a content type
/// decodes to `T::default()`.
#[derive(Debug, Clone, Default)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::rejected_body(e.status(), e.body_text()))?;
            return Ok(Payload(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::rejected_body(e.status(), e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(T::default()));
        }
        if !content_type.is_empty() && !content_type.starts_with("application/json") {
            return Err(ApiError::bad_request(format!(
                "unsupported content type {:?}",
                content_type
            )));
        }
        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(Payload(value))
    }
}

/// Every cart mutation body. Fields a given action does not use are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CartForm {
    pub csrf_token: Option<String>,
    pub product_id: Option<RawField>,
    pub quantity: Option<RawField>,
}

impl CartForm {
    /// Raw add payload for the field validator.
    pub fn raw_input(&self) -> RawCartInput {
        RawCartInput {
            product_id: self.product_id.clone(),
            quantity: self.quantity.clone(),
        }
    }

    /// Integral `product_id`; range checks belong to the cart service.
    pub fn product_id(&self) -> Result<i64, FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = integer(&self.product_id, "product_id", "Valid product ID is required", &mut errors);
        id.ok_or(errors)
    }

    /// Integral `product_id` and `quantity`, both reported at once.
    pub fn product_and_quantity(&self) -> Result<(i64, i64), FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = integer(&self.product_id, "product_id", "Valid product ID is required", &mut errors);
        let quantity = integer(&self.quantity, "quantity", "Valid quantity is required", &mut errors);
        match (id, quantity) {
            (Some(id), Some(quantity)) => Ok((id, quantity)),
            _ => Err(errors),
        }
    }
}

fn integer(
    field: &Option<RawField>,
    name: &str,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<i64> {
    let value = field.as_ref().and_then(RawField::as_integer);
    if value.is_none() {
        errors.insert(name, message);
    }
    value
}
