//! Cart Consistency Service - business rules above the cart store

use crate::domain::validation::{FIELD_PRODUCT_ID, FIELD_QUANTITY};
use crate::domain::{
    validate_cart_data, CartSummary, FieldErrors, RawCartInput, SummaryLine, ValidatedLine,
    MAX_QUANTITY_PER_REQUEST,
};
use crate::error::{CartError, CartResult};
use crate::ports::inbound::CartApi;
use sf_03_cart_store::CartStore;
use shared_types::{CartLine, CatalogLookup, Money, ProductId, SessionId};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Cart service configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartServiceConfig {
    /// Upper bound enforced by [`CartApi::validate_cart_data`].
    pub max_quantity_per_request: u32,
}

impl Default for CartServiceConfig {
    fn default() -> Self {
        Self {
            max_quantity_per_request: MAX_QUANTITY_PER_REQUEST,
        }
    }
}

/// Cart Consistency Service.
pub struct CartService {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogLookup>,
    config: CartServiceConfig,
}

impl CartService {
    pub fn new(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogLookup>,
        config: CartServiceConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    fn product_id(raw: i64, errors: &mut FieldErrors) -> Option<ProductId> {
        let id = ProductId::new(raw);
        if id.is_none() {
            errors.insert(FIELD_PRODUCT_ID, "Invalid product ID");
        }
        id
    }
}

impl CartApi for CartService {
    fn add_to_cart(
        &self,
        session: &SessionId,
        product_id: i64,
        quantity: i64,
    ) -> CartResult<CartLine> {
        let mut errors = FieldErrors::new();
        let product = Self::product_id(product_id, &mut errors);
        let quantity = if quantity > 0 {
            NonZeroU32::new(u32::try_from(quantity).unwrap_or(u32::MAX))
        } else {
            None
        };
        if quantity.is_none() {
            errors.insert(FIELD_QUANTITY, "Quantity must be positive");
        }
        let (product, quantity) = match (product, quantity) {
            (Some(product), Some(quantity)) => (product, quantity),
            _ => return Err(CartError::InvalidInput(errors)),
        };

        if self.catalog.find_product(product)?.is_none() {
            tracing::debug!(product = %product, "[sf-04] add rejected, unknown product");
            return Err(CartError::ProductNotFound {
                product_id: product,
            });
        }

        let line = self.store.add(session, product, quantity)?;
        tracing::info!(
            session = %session.short(),
            product = %product,
            added = quantity.get(),
            quantity = line.quantity,
            "[sf-04] added to cart"
        );
        Ok(line)
    }

    fn update_quantity(
        &self,
        session: &SessionId,
        product_id: i64,
        quantity: i64,
    ) -> CartResult<Option<CartLine>> {
        let mut errors = FieldErrors::new();
        let product = Self::product_id(product_id, &mut errors);
        if quantity < 0 {
            errors.insert(FIELD_QUANTITY, "Quantity cannot be negative");
        }
        let product = match product {
            Some(product) if errors.is_empty() => product,
            _ => return Err(CartError::InvalidInput(errors)),
        };

        let line = self.store.set_quantity(session, product, quantity)?;
        tracing::info!(
            session = %session.short(),
            product = %product,
            quantity = line.as_ref().map_or(0, |l| l.quantity),
            "[sf-04] cart quantity updated"
        );
        Ok(line)
    }

    fn remove_from_cart(&self, session: &SessionId, product_id: i64) -> CartResult<bool> {
        let mut errors = FieldErrors::new();
        let product = match Self::product_id(product_id, &mut errors) {
            Some(product) => product,
            None => return Err(CartError::InvalidInput(errors)),
        };
        let removed = self.store.remove(session, product)?;
        tracing::info!(
            session = %session.short(),
            product = %product,
            removed,
            "[sf-04] removed from cart"
        );
        Ok(removed)
    }

    fn clear(&self, session: &SessionId) -> CartResult<usize> {
        let cleared = self.store.clear(session)?;
        tracing::info!(session = %session.short(), cleared, "[sf-04] cart cleared");
        Ok(cleared)
    }

    fn summary(&self, session: &SessionId) -> CartResult<CartSummary> {
        let lines = self.store.lines(session)?;
        let mut summary = CartSummary::empty();
        for line in &lines {
            summary.item_count += u64::from(line.quantity);
            if let Some(product) = self.catalog.find_product(line.product_id)? {
                let priced = SummaryLine::priced(line, product);
                summary.total = summary.total + priced.line_total;
                summary.lines.push(priced);
            }
        }
        Ok(summary)
    }

    fn item_count(&self, session: &SessionId) -> CartResult<u64> {
        Ok(self.store.item_count(session)?)
    }

    fn total(&self, session: &SessionId) -> CartResult<Money> {
        Ok(self.store.total(session, self.catalog.as_ref())?)
    }

    fn validate_cart_data(&self, raw: &RawCartInput) -> CartResult<ValidatedLine> {
        validate_cart_data(raw, self.config.max_quantity_per_request)
            .map_err(CartError::InvalidInput)
    }
}
