//! Cart Store over the durable key-value port.

use crate::domain::{QuantityCap, SetOutcome};
use crate::error::{CartStoreError, CartStoreResult};
use crate::ports::inbound::{CartStore, LivenessCheck};
use shared_types::{
    decode_record, encode_record, transact_with, BatchOperation, CartLine, CatalogLookup,
    KeyPrefix, KeyValueRead, KeyValueStore, Money, ProductId, SessionId, TimeSource, Timestamp,
};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

/// [`CartStore`] backed by a [`KeyValueStore`].
///
/// Lines live under `cart:{session}:{product}`, so the key itself is the
/// uniqueness constraint on the pair.
pub struct KvCartStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn TimeSource>,
    cap: QuantityCap,
}

impl KvCartStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn TimeSource>, cap: QuantityCap) -> Self {
        Self { store, clock, cap }
    }

    pub fn cap(&self) -> QuantityCap {
        self.cap
    }

    fn load_line(
        view: &dyn KeyValueRead,
        session: &SessionId,
        product: ProductId,
    ) -> Result<Option<CartLine>, CartStoreError> {
        Ok(view
            .get(&KeyPrefix::cart_line(session, product))?
            .map(|bytes| decode_record(&bytes))
            .transpose()?)
    }

    fn put_line(line: &CartLine) -> CartStoreResult<BatchOperation> {
        Ok(BatchOperation::put(
            KeyPrefix::cart_line(&line.session_id, line.product_id),
            encode_record(line)?,
        ))
    }
}

impl CartStore for KvCartStore {
    fn add(
        &self,
        session: &SessionId,
        product: ProductId,
        quantity: NonZeroU32,
    ) -> CartStoreResult<CartLine> {
        let now = self.clock.now();
        let cap = self.cap;

        let line = transact_with(self.store.as_ref(), |view| -> CartStoreResult<_> {
            let line = match Self::load_line(view, session, product)? {
                Some(mut existing) => {
                    existing.quantity = cap.merge(existing.quantity, quantity);
                    existing.updated_at = now;
                    existing
                }
                None => CartLine {
                    session_id: session.clone(),
                    product_id: product,
                    quantity: cap.merge(0, quantity),
                    created_at: now,
                    updated_at: now,
                },
            };
            Ok((vec![Self::put_line(&line)?], line))
        })?;

        tracing::debug!(
            session = %session.short(),
            product = %product,
            added = quantity.get(),
            quantity = line.quantity,
            "[sf-03] cart line merged"
        );
        Ok(line)
    }

    fn set_quantity(
        &self,
        session: &SessionId,
        product: ProductId,
        quantity: i64,
    ) -> CartStoreResult<Option<CartLine>> {
        let target = match self.cap.set(quantity) {
            SetOutcome::Remove => {
                self.remove(session, product)?;
                return Ok(None);
            }
            SetOutcome::Replace(target) => target,
        };
        let now = self.clock.now();

        let line = transact_with(self.store.as_ref(), |view| -> CartStoreResult<_> {
            match Self::load_line(view, session, product)? {
                Some(mut line) => {
                    line.quantity = target;
                    line.updated_at = now;
                    Ok((vec![Self::put_line(&line)?], Some(line)))
                }
                None => Ok((Vec::new(), None)),
            }
        })?;

        tracing::debug!(
            session = %session.short(),
            product = %product,
            quantity = target,
            replaced = line.is_some(),
            "[sf-03] cart line quantity set"
        );
        Ok(line)
    }

    fn remove(&self, session: &SessionId, product: ProductId) -> CartStoreResult<bool> {
        let key = KeyPrefix::cart_line(session, product);
        let existed = transact_with(self.store.as_ref(), |view| -> CartStoreResult<_> {
            let existed = view.get(&key)?.is_some();
            let ops = if existed {
                vec![BatchOperation::delete(key.clone())]
            } else {
                Vec::new()
            };
            Ok((ops, existed))
        })?;
        if existed {
            tracing::debug!(session = %session.short(), product = %product, "[sf-03] cart line removed");
        }
        Ok(existed)
    }

    fn clear(&self, session: &SessionId) -> CartStoreResult<usize> {
        let prefix = KeyPrefix::cart_of(session);
        let cleared = transact_with(self.store.as_ref(), |view| -> CartStoreResult<_> {
            let ops: Vec<_> = view
                .prefix_scan(&prefix)?
                .into_iter()
                .map(|(key, _)| BatchOperation::delete(key))
                .collect();
            let cleared = ops.len();
            Ok((ops, cleared))
        })?;
        tracing::debug!(session = %session.short(), cleared, "[sf-03] cart cleared");
        Ok(cleared)
    }

    fn lines(&self, session: &SessionId) -> CartStoreResult<Vec<CartLine>> {
        let mut lines = self
            .store
            .prefix_scan(&KeyPrefix::cart_of(session))?
            .into_iter()
            .map(|(_, bytes)| decode_record::<CartLine>(&bytes))
            .collect::<Result<Vec<_>, _>>()?;
        lines.sort_by_key(|line| (line.created_at, line.product_id));
        Ok(lines)
    }

    fn item_count(&self, session: &SessionId) -> CartStoreResult<u64> {
        Ok(self
            .lines(session)?
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum())
    }

    fn total(&self, session: &SessionId, prices: &dyn CatalogLookup) -> CartStoreResult<Money> {
        let mut total = Money::ZERO;
        for line in self.lines(session)? {
            if let Some(product) = prices.find_product(line.product_id)? {
                total = total + product.price.times(line.quantity);
            }
        }
        Ok(total)
    }

    fn purge_abandoned(
        &self,
        is_live: &LivenessCheck<'_>,
        cutoff: Timestamp,
    ) -> CartStoreResult<usize> {
        let purged = transact_with(self.store.as_ref(), |view| -> CartStoreResult<_> {
            let mut ops = Vec::new();
            let mut verdicts: HashMap<SessionId, bool> = HashMap::new();
            for (key, bytes) in view.prefix_scan(&KeyPrefix::CartLine.family())? {
                let line: CartLine = decode_record(&bytes)?;
                if line.updated_at >= cutoff {
                    continue;
                }
                let live = match verdicts.get(&line.session_id) {
                    Some(live) => *live,
                    None => {
                        let live = is_live(view, &line.session_id)?;
                        verdicts.insert(line.session_id.clone(), live);
                        live
                    }
                };
                if !live {
                    ops.push(BatchOperation::delete(key));
                }
            }
            let purged = ops.len();
            Ok((ops, purged))
        })?;
        if purged > 0 {
            tracing::info!(purged, cutoff, "[sf-03] abandoned cart lines purged");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ErrorKind, InMemoryKVStore, KVStoreError, ManualTimeSource, Product};
    use std::collections::HashMap;
    use std::time::Duration;

    struct PriceList(HashMap<u64, Money>);

    impl CatalogLookup for PriceList {
        fn find_product(&self, id: ProductId) -> Result<Option<Product>, KVStoreError> {
            Ok(self.0.get(&id.get()).map(|price| Product {
                id,
                name: format!("product {}", id),
                description: String::new(),
                price: *price,
                image_path: None,
                created_at: 0,
            }))
        }
    }

    fn pid(raw: i64) -> ProductId {
        ProductId::new(raw).unwrap()
    }

    fn nz(v: u32) -> NonZeroU32 {
        NonZeroU32::new(v).unwrap()
    }

    fn setup() -> (Arc<InMemoryKVStore>, Arc<ManualTimeSource>, KvCartStore) {
        let store = Arc::new(InMemoryKVStore::new());
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let cart = KvCartStore::new(store.clone(), clock.clone(), QuantityCap::default());
        (store, clock, cart)
    }

    #[test]
    fn test_add_merges_into_single_line() {
        let (_, _, cart) = setup();
        let s = SessionId::generate();
        cart.add(&s, pid(7), nz(2)).unwrap();
        cart.add(&s, pid(7), nz(3)).unwrap();

        let lines = cart.lines(&s).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[test]
    fn test_add_saturates_at_cap() {
        let store = Arc::new(InMemoryKVStore::new());
        let clock = Arc::new(ManualTimeSource::new(0));
        let cart = KvCartStore::new(store, clock, QuantityCap::new(10));
        let s = SessionId::generate();
        cart.add(&s, pid(1), nz(8)).unwrap();
        let line = cart.add(&s, pid(1), nz(8)).unwrap();
        assert_eq!(line.quantity, 10);
    }

    #[test]
    fn test_add_keeps_creation_time() {
        let (_, clock, cart) = setup();
        let s = SessionId::generate();
        cart.add(&s, pid(1), nz(1)).unwrap();
        clock.advance(Duration::from_secs(5));
        let line = cart.add(&s, pid(1), nz(1)).unwrap();
        assert_eq!(line.created_at, 1_000);
        assert_eq!(line.updated_at, 6_000);
    }

    #[test]
    fn test_set_quantity_replaces() {
        let (_, _, cart) = setup();
        let s = SessionId::generate();
        cart.add(&s, pid(7), nz(5)).unwrap();
        let line = cart.set_quantity(&s, pid(7), 1).unwrap().unwrap();
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let (_, _, cart) = setup();
        let s = SessionId::generate();
        cart.add(&s, pid(7), nz(5)).unwrap();
        assert!(cart.set_quantity(&s, pid(7), 0).unwrap().is_none());
        assert!(cart.lines(&s).unwrap().is_empty());

        cart.add(&s, pid(8), nz(1)).unwrap();
        assert!(cart.set_quantity(&s, pid(8), -2).unwrap().is_none());
        assert!(cart.lines(&s).unwrap().is_empty());
    }

    #[test]
    fn test_set_quantity_absent_line_is_not_created() {
        let (_, _, cart) = setup();
        let s = SessionId::generate();
        assert!(cart.set_quantity(&s, pid(3), 4).unwrap().is_none());
        assert!(cart.lines(&s).unwrap().is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_, _, cart) = setup();
        let s = SessionId::generate();
        assert!(!cart.remove(&s, pid(7)).unwrap());
        cart.add(&s, pid(7), nz(1)).unwrap();
        assert!(cart.remove(&s, pid(7)).unwrap());
        assert!(!cart.remove(&s, pid(7)).unwrap());
    }

    #[test]
    fn test_clear_only_touches_own_session() {
        let (_, _, cart) = setup();
        let mine = SessionId::generate();
        let theirs = SessionId::generate();
        cart.add(&mine, pid(1), nz(1)).unwrap();
        cart.add(&mine, pid(2), nz(1)).unwrap();
        cart.add(&theirs, pid(1), nz(4)).unwrap();

        assert_eq!(cart.clear(&mine).unwrap(), 2);
        assert_eq!(cart.item_count(&mine).unwrap(), 0);
        assert_eq!(cart.item_count(&theirs).unwrap(), 4);
    }

    #[test]
    fn test_lines_ordered_by_creation() {
        let (_, clock, cart) = setup();
        let s = SessionId::generate();
        cart.add(&s, pid(30), nz(1)).unwrap();
        clock.advance(Duration::from_millis(1));
        cart.add(&s, pid(2), nz(1)).unwrap();
        clock.advance(Duration::from_millis(1));
        cart.add(&s, pid(15), nz(1)).unwrap();
        cart.add(&s, pid(30), nz(1)).unwrap();

        let order: Vec<_> = cart
            .lines(&s)
            .unwrap()
            .into_iter()
            .map(|l| l.product_id.get())
            .collect();
        assert_eq!(order, vec![30, 2, 15]);
    }

    #[test]
    fn test_total_uses_live_prices() {
        let (_, _, cart) = setup();
        let s = SessionId::generate();
        cart.add(&s, pid(1), nz(2)).unwrap();
        cart.add(&s, pid(2), nz(1)).unwrap();

        let mut prices = PriceList(HashMap::from([
            (1, Money::from_cents(1_000)),
            (2, Money::from_cents(250)),
        ]));
        assert_eq!(cart.total(&s, &prices).unwrap(), Money::from_cents(2_250));

        prices.0.insert(1, Money::from_cents(1_500));
        assert_eq!(cart.total(&s, &prices).unwrap(), Money::from_cents(3_250));

        // A product that left the catalog contributes nothing but still counts.
        prices.0.remove(&2);
        assert_eq!(cart.total(&s, &prices).unwrap(), Money::from_cents(3_000));
        assert_eq!(cart.item_count(&s).unwrap(), 3);
    }

    #[test]
    fn test_empty_cart_aggregates_are_zero() {
        let (_, _, cart) = setup();
        let s = SessionId::generate();
        assert_eq!(cart.item_count(&s).unwrap(), 0);
        assert_eq!(
            cart.total(&s, &PriceList(HashMap::new())).unwrap(),
            Money::ZERO
        );
    }

    #[test]
    fn test_purge_abandoned_spares_live_and_recent() {
        let (_, clock, cart) = setup();
        let live = SessionId::generate();
        let dead_old = SessionId::generate();
        let dead_recent = SessionId::generate();

        cart.add(&live, pid(1), nz(1)).unwrap();
        cart.add(&dead_old, pid(1), nz(1)).unwrap();
        clock.advance(Duration::from_secs(100));
        cart.add(&dead_recent, pid(1), nz(1)).unwrap();

        let purged = cart
            .purge_abandoned(
                &|_: &dyn KeyValueRead, id: &SessionId| Ok(*id == live),
                50_000,
            )
            .unwrap();
        assert_eq!(purged, 1);
        assert_eq!(cart.item_count(&live).unwrap(), 1);
        assert_eq!(cart.item_count(&dead_old).unwrap(), 0);
        assert_eq!(cart.item_count(&dead_recent).unwrap(), 1);
    }

    #[test]
    fn test_purge_judges_liveness_through_the_transaction_view() {
        let (store, clock, cart) = setup();
        let kept = SessionId::generate();
        let dropped = SessionId::generate();
        cart.add(&kept, pid(1), nz(1)).unwrap();
        cart.add(&kept, pid(2), nz(2)).unwrap();
        cart.add(&dropped, pid(1), nz(1)).unwrap();
        store
            .atomic_batch_write(vec![BatchOperation::put(KeyPrefix::session(&kept), vec![1])])
            .unwrap();
        clock.advance(Duration::from_secs(100));

        let asked = std::sync::atomic::AtomicUsize::new(0);
        let purged = cart
            .purge_abandoned(
                &|view: &dyn KeyValueRead, id: &SessionId| {
                    asked.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(view.get(&KeyPrefix::session(id))?.is_some())
                },
                clock.now(),
            )
            .unwrap();
        assert_eq!(purged, 1);
        assert_eq!(cart.item_count(&kept).unwrap(), 3);
        assert_eq!(cart.item_count(&dropped).unwrap(), 0);
        // One verdict per session, not per line.
        assert_eq!(asked.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_purge_liveness_failure_deletes_nothing() {
        let (_, clock, cart) = setup();
        let s = SessionId::generate();
        cart.add(&s, pid(1), nz(1)).unwrap();
        clock.advance(Duration::from_secs(100));

        let err = cart
            .purge_abandoned(
                &|_: &dyn KeyValueRead, _: &SessionId| {
                    Err(KVStoreError::Unavailable {
                        message: "down".into(),
                    })
                },
                clock.now(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert_eq!(cart.item_count(&s).unwrap(), 1);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let (_, _, cart) = setup();
        let s = SessionId::generate();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        cart.add(&s, pid(7), nz(1)).unwrap();
                    }
                });
            }
        });
        let lines = cart.lines(&s).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 200);
    }

    #[test]
    fn test_unavailable_store_is_storage_error() {
        let (store, _, cart) = setup();
        store.set_available(false);
        let err = cart.add(&SessionId::generate(), pid(1), nz(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    }
}
