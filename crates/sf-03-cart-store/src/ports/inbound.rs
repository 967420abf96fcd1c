//! Driving Ports (API - Inbound)

use crate::error::CartStoreResult;
use shared_types::{
    CartLine, CatalogLookup, KVStoreError, KeyValueRead, Money, ProductId, SessionId, Timestamp,
};
use std::num::NonZeroU32;

/// Decides whether a session is live, reading through the purge
/// transaction's view.
pub type LivenessCheck<'a> =
    dyn Fn(&dyn KeyValueRead, &SessionId) -> Result<bool, KVStoreError> + 'a;

/// Durable cart lines keyed by `(session, product)`.
///
/// Every operation is scoped to one session and never touches another
/// session's lines.
pub trait CartStore: Send + Sync {
    /// Merge `quantity` into the line, creating it when absent.
    ///
    /// Single atomic read-modify-write: concurrent adds to the same pair
    /// both take effect.
    fn add(
        &self,
        session: &SessionId,
        product: ProductId,
        quantity: NonZeroU32,
    ) -> CartStoreResult<CartLine>;

    /// Replace the quantity (last writer wins). `quantity <= 0` removes the
    /// line. An absent line is not created. Returns the stored line, if any.
    fn set_quantity(
        &self,
        session: &SessionId,
        product: ProductId,
        quantity: i64,
    ) -> CartStoreResult<Option<CartLine>>;

    /// Delete the line if present. Returns whether it existed.
    fn remove(&self, session: &SessionId, product: ProductId) -> CartStoreResult<bool>;

    /// Delete every line of the session. Returns how many.
    fn clear(&self, session: &SessionId) -> CartStoreResult<usize>;

    /// Current lines ordered by creation time.
    fn lines(&self, session: &SessionId) -> CartStoreResult<Vec<CartLine>>;

    /// Sum of quantities over every line.
    fn item_count(&self, session: &SessionId) -> CartStoreResult<u64>;

    /// Sum of quantity times current catalog price. Lines whose product no
    /// longer exists contribute nothing.
    fn total(&self, session: &SessionId, prices: &dyn CatalogLookup) -> CartStoreResult<Money>;

    /// Delete lines whose session is not live and whose last update is
    /// older than `cutoff`. Returns how many.
    ///
    /// `is_live` is asked inside the same transaction as the deletes, so a
    /// session regenerated concurrently is judged under its new identifier.
    /// It runs while the store is locked and must read only through the
    /// view it is given.
    fn purge_abandoned(
        &self,
        is_live: &LivenessCheck<'_>,
        cutoff: Timestamp,
    ) -> CartStoreResult<usize>;
}
