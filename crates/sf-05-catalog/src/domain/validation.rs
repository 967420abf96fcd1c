//! Product field validation.
//!
//! | Field         | Rule                                    |
//! |---------------|-----------------------------------------|
//! | `name`        | required, at most 255 characters        |
//! | `description` | optional, at most 10 000 characters     |
//! | `price`       | `0 < price <= 999999.99`, two decimals  |
//! | `image_path`  | optional, absolute http(s) URL          |
//!
//! Values are trimmed and stored as given; output escaping belongs to
//! whatever renders them.

use serde::Deserialize;
use shared_types::{FieldErrors, Money};

pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_DESCRIPTION_CHARS: usize = 10_000;
pub const MAX_PRICE: Money = Money::from_cents(99_999_999);

/// Price as it arrived: JSON number or text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    fn to_money(&self) -> Option<Money> {
        match self {
            PriceField::Text(s) => s.parse().ok(),
            PriceField::Number(n) => {
                let cents = n * 100.0;
                let whole_cents = n.is_finite() && *n >= 0.0 && (cents - cents.round()).abs() < 1e-6;
                whole_cents.then(|| Money::from_cents(cents.round() as u64))
            }
        }
    }
}

/// Raw product payload (seed file or write request).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceField>,
    pub image_path: Option<String>,
}

/// Validated product fields, ready to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_path: Option<String>,
}

pub fn validate_product_data(raw: &RawProductInput) -> Result<ProductDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = raw.name.as_deref().unwrap_or_default().trim().to_string();
    if name.is_empty() {
        errors.insert("name", "Product name is required");
    } else if name.chars().count() > MAX_NAME_CHARS {
        errors.insert("name", "Product name must be less than 255 characters");
    }

    let description = raw
        .description
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string();
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.insert("description", "Description is too long");
    }

    let price = match raw.price.as_ref().and_then(PriceField::to_money) {
        Some(price) if price.is_zero() => {
            errors.insert("price", "Valid price is required");
            None
        }
        Some(price) if price > MAX_PRICE => {
            errors.insert("price", "Price is too high");
            None
        }
        Some(price) => Some(price),
        None => {
            errors.insert("price", "Valid price is required");
            None
        }
    };

    let image_path = raw
        .image_path
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(url) = &image_path {
        if !is_http_url(url) {
            errors.insert("image_path", "Invalid image URL");
        }
    }

    match price {
        Some(price) if errors.is_empty() => Ok(ProductDraft {
            name,
            description,
            price,
            image_path,
        }),
        _ => Err(errors),
    }
}

fn is_http_url(candidate: &str) -> bool {
    let rest = match candidate
        .strip_prefix("https://")
        .or_else(|| candidate.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !host.is_empty()
        && !candidate.chars().any(char::is_whitespace)
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}
