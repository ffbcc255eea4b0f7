//! Cart store.
//!
//! Owns the cart's line items. Every mutation writes the full list back to
//! the key-value store and broadcasts a [`CartEvent`] so other parts of the
//! front end (e.g. the header item-count badge) can refresh. A mutation only
//! takes effect in memory once its write has succeeded.
//!
//! The store enforces these invariants:
//! - no two line items share a product id
//! - every quantity is at least 1
//! - prices are non-negative and the subtotal stays within
//!   [`bazaar_core::MAX_SUBTOTAL`]

mod view;

pub use view::{CartItemView, CartView};

use bazaar_core::{CartLineItem, CartProduct, PricingError, ProductId, pricing};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::models::storage_keys;
use crate::storage::{KeyValueStore, StorageError, load_json, save_json};

/// Capacity of the change-notification channel.
const EVENT_CAPACITY: usize = 16;

/// What changed in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEventKind {
    Added(ProductId),
    QuantityChanged(ProductId),
    Removed(ProductId),
    Cleared,
}

/// Change notification emitted after every persisted cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartEvent {
    pub kind: CartEventKind,
    /// Sum of all quantities after the change.
    pub item_count: u64,
}

/// Result of [`CartStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The product is already in the cart; nothing changed.
    AlreadyInCart,
    /// The product would push the cart past the pricing limits; nothing
    /// changed.
    OverLimit,
}

/// Result of [`CartStore::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    Updated,
    /// The requested quantity was below 1; nothing changed.
    Ignored,
    /// No line item has that product id; nothing changed.
    NotInCart,
    /// The new quantity would push the cart past the pricing limits;
    /// nothing changed.
    OverLimit,
}

/// Persisted list of cart line items.
#[derive(Debug)]
pub struct CartStore<S> {
    store: S,
    items: Vec<CartLineItem>,
    events: broadcast::Sender<CartEvent>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Open the cart persisted in `store`.
    ///
    /// A missing or malformed document yields an empty cart.
    pub fn open(store: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut cart = Self {
            store,
            items: Vec::new(),
            events,
        };
        cart.load();
        cart
    }

    /// Re-read the persisted list, replacing the in-memory copy.
    ///
    /// Returns an empty list if nothing is persisted or the document is
    /// malformed.
    pub fn load(&mut self) -> &[CartLineItem] {
        let items: Vec<CartLineItem> =
            load_json(&self.store, storage_keys::CART).unwrap_or_default();
        self.items = sanitize(items);
        &self.items
    }

    /// Current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line item by product id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities, as shown on the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Overflow` if the sum does not fit in a
    /// `Decimal`, which the store's limits rule out.
    pub fn subtotal(&self) -> Result<Decimal, PricingError> {
        pricing::subtotal(&self.items)
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    /// Append `product` with quantity 1.
    ///
    /// Adding a product that is already in the cart leaves the cart as it
    /// is and returns [`AddOutcome::AlreadyInCart`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be persisted.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add(&mut self, product: CartProduct) -> Result<AddOutcome, StorageError> {
        if self.get(product.id).is_some() {
            tracing::info!("Product already in cart");
            return Ok(AddOutcome::AlreadyInCart);
        }

        let id = product.id;
        let mut items = self.items.clone();
        items.push(CartLineItem::from(product));
        if !pricing::within_limits(&items) {
            tracing::warn!("Product would exceed cart limits");
            return Ok(AddOutcome::OverLimit);
        }
        self.commit(items, CartEventKind::Added(id))?;

        let product_id = id.to_string();
        add_breadcrumb("cart", "Added item", Some(&[("product_id", product_id.as_str())]));
        Ok(AddOutcome::Added)
    }

    /// Set the quantity of the line item for `id`.
    ///
    /// Quantities below 1 are ignored rather than rejected, as are
    /// quantities that would push the cart past the pricing limits.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &mut self,
        id: ProductId,
        quantity: i64,
    ) -> Result<QuantityUpdate, StorageError> {
        let Some(quantity) = u32::try_from(quantity).ok().filter(|q| *q >= 1) else {
            tracing::debug!("Ignoring invalid quantity");
            return Ok(QuantityUpdate::Ignored);
        };

        let mut items = self.items.clone();
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(QuantityUpdate::NotInCart);
        };

        item.quantity = quantity;
        if !pricing::within_limits(&items) {
            tracing::warn!("Quantity would exceed cart limits");
            return Ok(QuantityUpdate::OverLimit);
        }
        self.commit(items, CartEventKind::QuantityChanged(id))?;
        Ok(QuantityUpdate::Updated)
    }

    /// Remove the line item for `id`, returning it if it was present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: ProductId) -> Result<Option<CartLineItem>, StorageError> {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return Ok(None);
        };

        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit(items, CartEventKind::Removed(id))?;

        let product_id = id.to_string();
        add_breadcrumb("cart", "Removed item", Some(&[("product_id", product_id.as_str())]));
        Ok(Some(removed))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.commit(Vec::new(), CartEventKind::Cleared)?;

        add_breadcrumb("cart", "Cleared cart", None);
        Ok(())
    }

    /// Persist `items`, then make them the current list and notify
    /// subscribers. On a failed write the current list is left as it was.
    fn commit(&mut self, items: Vec<CartLineItem>, kind: CartEventKind) -> Result<(), StorageError> {
        save_json(&self.store, storage_keys::CART, &items)?;
        self.items = items;

        let event = CartEvent {
            kind,
            item_count: self.item_count(),
        };
        tracing::debug!(?event, "Cart updated");
        // No subscribers is fine
        let _ = self.events.send(event);
        Ok(())
    }
}

/// Restore the invariants on a list read from storage: drop zero-quantity
/// lines, keep only the first line per product id, and drop lines that
/// break the pricing limits.
fn sanitize(items: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut clean: Vec<CartLineItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 || clean.iter().any(|existing| existing.id == item.id) {
            tracing::warn!(product_id = %item.id, "Dropping invalid persisted line item");
            continue;
        }
        let id = item.id;
        clean.push(item);
        if !pricing::within_limits(&clean) {
            clean.pop();
            tracing::warn!(product_id = %id, "Dropping over-limit persisted line item");
        }
    }
    clean
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::storage::tests::FailingStore;

    fn product(id: i64, price: i64) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            slug: format!("product-{id}"),
            price: Decimal::new(price, 0),
            image: None,
        }
    }

    #[test]
    fn test_open_empty_store() {
        let cart = CartStore::open(MemoryStore::new());
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_open_malformed_store_is_empty() {
        let store = MemoryStore::new();
        store.set(storage_keys::CART, "definitely not json").unwrap();

        let cart = CartStore::open(store);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_appends_with_quantity_one_and_persists() {
        let store = MemoryStore::new();
        let mut cart = CartStore::open(store.clone());

        assert_eq!(cart.add(product(1, 500)).unwrap(), AddOutcome::Added);
        assert_eq!(cart.add(product(2, 250)).unwrap(), AddOutcome::Added);

        let ids: Vec<i64> = cart.items().iter().map(|i| i.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(cart.items().iter().all(|i| i.quantity == 1));

        let reopened = CartStore::open(store);
        assert_eq!(reopened.items(), cart.items());
    }

    #[test]
    fn test_add_duplicate_is_rejected() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add(product(1, 500)).unwrap();
        cart.update_quantity(ProductId::new(1), 3).unwrap();
        let before = cart.items().to_vec();

        let mut duplicate = product(1, 999);
        duplicate.name = "Renamed".to_string();
        assert_eq!(cart.add(duplicate).unwrap(), AddOutcome::AlreadyInCart);
        assert_eq!(cart.items(), before.as_slice());
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add(product(1, 500)).unwrap();

        assert_eq!(
            cart.update_quantity(ProductId::new(1), 4).unwrap(),
            QuantityUpdate::Updated
        );
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 4);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_update_quantity_below_one_is_ignored() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add(product(1, 500)).unwrap();
        cart.update_quantity(ProductId::new(1), 2).unwrap();

        for quantity in [0, -1, -100] {
            assert_eq!(
                cart.update_quantity(ProductId::new(1), quantity).unwrap(),
                QuantityUpdate::Ignored
            );
        }
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 2);
    }

    #[test]
    fn test_update_quantity_unknown_id() {
        let mut cart = CartStore::open(MemoryStore::new());
        assert_eq!(
            cart.update_quantity(ProductId::new(9), 2).unwrap(),
            QuantityUpdate::NotInCart
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let store = MemoryStore::new();
        let mut cart = CartStore::open(store.clone());
        cart.add(product(1, 500)).unwrap();
        cart.add(product(2, 250)).unwrap();

        let removed = cart.remove(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(removed.id, ProductId::new(1));
        assert!(cart.remove(ProductId::new(1)).unwrap().is_none());
        assert_eq!(cart.items().len(), 1);

        cart.clear().unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().unwrap(), Decimal::ZERO);
        assert!(CartStore::open(store).is_empty());
    }

    #[test]
    fn test_subtotal() {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add(product(1, 500)).unwrap();
        cart.add(product(2, 120)).unwrap();
        cart.update_quantity(ProductId::new(1), 2).unwrap();
        assert_eq!(cart.subtotal().unwrap(), Decimal::new(1120, 0));
    }

    #[test]
    fn test_mutations_emit_events() {
        let mut cart = CartStore::open(MemoryStore::new());
        let mut events = cart.subscribe();

        cart.add(product(1, 500)).unwrap();
        cart.add(product(1, 500)).unwrap();
        cart.update_quantity(ProductId::new(1), 3).unwrap();
        cart.update_quantity(ProductId::new(1), 0).unwrap();
        cart.remove(ProductId::new(1)).unwrap();
        cart.clear().unwrap();

        let received: Vec<CartEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(
            received,
            vec![
                CartEvent {
                    kind: CartEventKind::Added(ProductId::new(1)),
                    item_count: 1
                },
                CartEvent {
                    kind: CartEventKind::QuantityChanged(ProductId::new(1)),
                    item_count: 3
                },
                CartEvent {
                    kind: CartEventKind::Removed(ProductId::new(1)),
                    item_count: 0
                },
                CartEvent {
                    kind: CartEventKind::Cleared,
                    item_count: 0
                },
            ]
        );
    }

    #[test]
    fn test_load_drops_duplicate_and_zero_quantity_lines() {
        let store = MemoryStore::new();
        store
            .set(
                storage_keys::CART,
                r#"[
                    {"id":1,"name":"A","sku":"A","slug":"a","price":"10","quantity":2},
                    {"id":1,"name":"A2","sku":"A","slug":"a","price":"10","quantity":5},
                    {"id":2,"name":"B","sku":"B","slug":"b","price":"5","quantity":0}
                ]"#,
            )
            .unwrap();

        let cart = CartStore::open(store);
        assert_eq!(cart.items().len(), 1);
        let first = cart.items().first().unwrap();
        assert_eq!(first.name, "A");
        assert_eq!(first.quantity, 2);
    }

    #[test]
    fn test_load_drops_over_limit_and_negative_lines() {
        let store = MemoryStore::new();
        store
            .set(
                storage_keys::CART,
                r#"[
                    {"id":1,"name":"A","sku":"A","slug":"a","price":"10","quantity":2},
                    {"id":2,"name":"B","sku":"B","slug":"b","price":"79228162514264337593543950335","quantity":2},
                    {"id":3,"name":"C","sku":"C","slug":"c","price":"-5","quantity":1},
                    {"id":4,"name":"D","sku":"D","slug":"d","price":"4","quantity":1}
                ]"#,
            )
            .unwrap();

        let cart = CartStore::open(store);
        let ids: Vec<i64> = cart.items().iter().map(|i| i.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(cart.subtotal().unwrap(), Decimal::new(24, 0));
    }

    #[test]
    fn test_over_limit_changes_are_refused() {
        let store = MemoryStore::new();
        let mut cart = CartStore::open(store.clone());
        let mut events = cart.subscribe();

        let mut huge = product(1, 0);
        huge.price = Decimal::MAX;
        assert_eq!(cart.add(huge).unwrap(), AddOutcome::OverLimit);
        assert!(cart.is_empty());

        let mut large = product(2, 0);
        large.price = pricing::MAX_SUBTOTAL;
        assert_eq!(cart.add(large).unwrap(), AddOutcome::Added);
        assert_eq!(
            cart.update_quantity(ProductId::new(2), 2).unwrap(),
            QuantityUpdate::OverLimit
        );
        assert_eq!(cart.add(product(3, 1)).unwrap(), AddOutcome::OverLimit);

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal().unwrap(), pricing::MAX_SUBTOTAL);
        assert_eq!(CartStore::open(store).items(), cart.items());

        let received: Vec<CartEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(received.len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_cart_unchanged() {
        let store = FailingStore::default();
        let mut cart = CartStore::open(store.clone());
        cart.add(product(1, 500)).unwrap();
        let mut events = cart.subscribe();
        store.fail_writes(storage_keys::CART);

        assert!(cart.add(product(2, 250)).is_err());
        assert!(cart.update_quantity(ProductId::new(1), 4).is_err());
        assert!(cart.remove(ProductId::new(1)).is_err());
        assert!(cart.clear().is_err());

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 1);
        assert_eq!(cart.subtotal().unwrap(), Decimal::new(500, 0));
        assert!(events.try_recv().is_err());

        store.heal();
        assert_eq!(cart.add(product(2, 250)).unwrap(), AddOutcome::Added);
        assert_eq!(CartStore::open(store).items().len(), 2);
    }

    #[test]
    fn test_failed_first_add_can_be_retried() {
        let store = FailingStore::default();
        store.fail_writes(storage_keys::CART);
        let mut cart = CartStore::open(store.clone());

        assert!(cart.add(product(1, 500)).is_err());
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);

        store.heal();
        assert_eq!(cart.add(product(1, 500)).unwrap(), AddOutcome::Added);
        assert_eq!(CartStore::open(store).item_count(), 1);
    }
}
