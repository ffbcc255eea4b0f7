//! Wishlist store.
//!
//! A persisted, de-duplicated list of products saved for later. Shares the
//! persistence rules of the cart: full-document writes that only take effect
//! in memory once they succeed, and malformed state treated as empty.

use bazaar_core::{ProductId, WishlistItem};
use tracing::instrument;

use crate::models::storage_keys;
use crate::storage::{KeyValueStore, StorageError, load_json, save_json};

/// Result of [`WishlistStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistAdd {
    Added,
    AlreadySaved,
}

/// Persisted list of saved products.
#[derive(Debug)]
pub struct WishlistStore<S> {
    store: S,
    items: Vec<WishlistItem>,
}

impl<S: KeyValueStore> WishlistStore<S> {
    /// Open the wishlist persisted in `store`.
    pub fn open(store: S) -> Self {
        let mut wishlist = Self {
            store,
            items: Vec::new(),
        };
        wishlist.load();
        wishlist
    }

    /// Re-read the persisted list.
    pub fn load(&mut self) -> &[WishlistItem] {
        let mut items: Vec<WishlistItem> =
            load_json(&self.store, storage_keys::WISHLIST).unwrap_or_default();
        let mut seen = Vec::with_capacity(items.len());
        items.retain(|item| {
            if seen.contains(&item.id) {
                false
            } else {
                seen.push(item.id);
                true
            }
        });
        self.items = items;
        &self.items
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Save `item` unless it is already on the list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wishlist cannot be persisted.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub fn add(&mut self, item: WishlistItem) -> Result<WishlistAdd, StorageError> {
        if self.contains(item.id) {
            return Ok(WishlistAdd::AlreadySaved);
        }
        let mut items = self.items.clone();
        items.push(item);
        self.commit(items)?;
        Ok(WishlistAdd::Added)
    }

    /// Remove the item for `id`, returning it if present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wishlist cannot be persisted.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: ProductId) -> Result<Option<WishlistItem>, StorageError> {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return Ok(None);
        };
        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit(items)?;
        Ok(Some(removed))
    }

    /// Empty the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wishlist cannot be persisted.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.commit(Vec::new())
    }

    fn commit(&mut self, items: Vec<WishlistItem>) -> Result<(), StorageError> {
        save_json(&self.store, storage_keys::WISHLIST, &items)?;
        self.items = items;
        Ok(())
    }
}
