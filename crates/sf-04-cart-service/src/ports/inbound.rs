//! Driving Ports (API - Inbound)

use crate::domain::{CartSummary, RawCartInput, ValidatedLine};
use crate::error::CartResult;
use shared_types::{CartLine, Money, SessionId};

/// Primary Cart Consistency API.
///
/// Product ids and quantities arrive as raw integers and are range checked
/// here; nothing reaches the store unvalidated.
pub trait CartApi: Send + Sync {
    /// Merge `quantity` of the product into the cart.
    ///
    /// `InvalidInput` when `product_id <= 0` or `quantity <= 0`; `NotFound`
    /// when the catalog has no such product. The catalog is consulted before
    /// the store is touched.
    fn add_to_cart(&self, session: &SessionId, product_id: i64, quantity: i64)
        -> CartResult<CartLine>;

    /// Replace a line's quantity. Zero removes the line; negative is invalid.
    fn update_quantity(
        &self,
        session: &SessionId,
        product_id: i64,
        quantity: i64,
    ) -> CartResult<Option<CartLine>>;

    /// Remove a line. Removing an absent line succeeds.
    fn remove_from_cart(&self, session: &SessionId, product_id: i64) -> CartResult<bool>;

    /// Remove every line of the session.
    fn clear(&self, session: &SessionId) -> CartResult<usize>;

    /// Lines, item count and total from one read. Never fails on an empty cart.
    fn summary(&self, session: &SessionId) -> CartResult<CartSummary>;

    fn item_count(&self, session: &SessionId) -> CartResult<u64>;

    fn total(&self, session: &SessionId) -> CartResult<Money>;

    /// Field-level validation of a raw add payload.
    fn validate_cart_data(&self, raw: &RawCartInput) -> CartResult<ValidatedLine>;
}
