//! Cart engine: mergeable line items with synchronous persistence.
//!
//! # Identity
//!
//! A line item is identified by its `(product_id, variant_id)` pair. Adding
//! with a pair already in the cart merges into the existing item; the cart
//! never holds two items with the same pair.
//!
//! # Persistence
//!
//! Every mutating operation writes the snapshot (`{ "items": [...] }` under
//! the `cart` key) before returning, so a restart immediately after a
//! mutation reflects it. The snapshot is independent of session state:
//! logging out or losing a session never touches the cart. Callers clear the
//! cart explicitly after a successful order.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sandpiper_core::{Price, ProductId, VariantId};

use crate::storage::{self, StorageBackend, StorageError};

/// Denormalized catalog data captured when an item is added.
///
/// Deliberately not re-validated against the live catalog; pricing here is
/// display state, and the order endpoint re-prices server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub stock: u32,
}

/// One product/variant entry in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl LineItem {
    fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.product_id == *product_id && self.variant_id.as_ref() == variant_id
    }

    /// Price × quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.extended(self.quantity)
    }
}

/// Persisted snapshot layout.
#[derive(Debug, Default, Deserialize)]
struct CartSnapshot {
    items: Vec<LineItem>,
}

#[derive(Serialize)]
struct CartSnapshotRef<'a> {
    items: &'a [LineItem],
}

/// In-memory cart with write-through persistence.
///
/// All operations are synchronous; exclusive access is enforced by `&mut
/// self` rather than a lock, matching the event-driven callers that own the
/// engine.
pub struct CartEngine {
    items: Vec<LineItem>,
    is_open: bool,
    storage: Arc<dyn StorageBackend>,
}

impl CartEngine {
    /// Open the cart, loading any persisted snapshot.
    ///
    /// An unreadable snapshot is discarded with a warning; the cart starts
    /// empty rather than failing session start.
    #[must_use]
    pub fn load(storage: Arc<dyn StorageBackend>) -> Self {
        let items = match storage.load(storage::keys::CART) {
            Ok(Some(raw)) => match serde_json::from_str::<CartSnapshot>(&raw) {
                Ok(snapshot) => snapshot.items,
                Err(error) => {
                    warn!(%error, "discarding unreadable cart snapshot");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(%error, "cart snapshot unavailable");
                Vec::new()
            }
        };

        Self {
            items,
            is_open: false,
            storage,
        }
    }

    /// Add `quantity` units of a product to the cart.
    ///
    /// Merges into an existing item with the same `(product, variant)`
    /// identity, otherwise appends. A zero quantity is ignored: an add can
    /// never remove, so silent removal via `add_item(.., 0, ..)` is ruled
    /// out. Callers that need validation feedback check preconditions
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot write fails.
    pub fn add_item(
        &mut self,
        product: ProductSnapshot,
        quantity: u32,
        variant_id: Option<VariantId>,
    ) -> Result<(), StorageError> {
        if quantity == 0 {
            debug!(product_id = %product.id, "ignoring zero-quantity add");
            return Ok(());
        }

        let product_id = product.id.clone();
        match self
            .items
            .iter_mut()
            .find(|item| item.matches(&product_id, variant_id.as_ref()))
        {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(LineItem {
                product_id,
                variant_id,
                product,
                quantity,
            }),
        }

        self.persist()
    }

    /// Remove the item with the given identity. Absent items are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot write fails.
    pub fn remove_item(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
    ) -> Result<(), StorageError> {
        let before = self.items.len();
        self.items
            .retain(|item| !item.matches(product_id, variant_id));
        if self.items.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Set an item's quantity to an absolute value.
    ///
    /// A quantity of zero behaves as [`Self::remove_item`]; absent items are
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot write fails.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
        variant_id: Option<&VariantId>,
    ) -> Result<(), StorageError> {
        if quantity == 0 {
            return self.remove_item(product_id, variant_id);
        }

        match self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, variant_id))
        {
            Some(item) => {
                item.quantity = quantity;
                self.persist()
            }
            None => Ok(()),
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot write fails.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        self.persist()
    }

    /// Current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, item| count.saturating_add(item.quantity))
    }

    /// Σ price × quantity over the current items.
    ///
    /// Recomputed on every call; never cached.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// UI visibility flag. Not part of the persisted snapshot.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Flip the UI visibility flag.
    pub const fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
    }

    /// Set the UI visibility flag.
    pub const fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    fn persist(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&CartSnapshotRef { items: &self.items })?;
        self.storage.store(storage::keys::CART, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use sandpiper_core::CurrencyCode;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    fn snapshot(id: &str, price: Decimal) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::new(price, CurrencyCode::USD),
            image: None,
            stock: 10,
        }
    }

    fn engine() -> (Arc<dyn StorageBackend>, CartEngine) {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let cart = CartEngine::load(Arc::clone(&storage));
        (storage, cart)
    }

    #[test]
    fn test_add_merges_same_identity() {
        let (_, mut cart) = engine();
        cart.add_item(snapshot("p1", dec("10")), 2, None).expect("add");
        cart.add_item(snapshot("p1", dec("10")), 3, None).expect("add");

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_variants_are_distinct_identities() {
        let (_, mut cart) = engine();
        cart.add_item(snapshot("p1", dec("10")), 1, None).expect("add");
        cart.add_item(snapshot("p1", dec("10")), 1, Some(VariantId::new("v1")))
            .expect("add");
        cart.add_item(snapshot("p1", dec("10")), 1, Some(VariantId::new("v2")))
            .expect("add");

        assert_eq!(cart.items().len(), 3);
    }

    #[test]
    fn test_zero_quantity_add_is_noop() {
        let (_, mut cart) = engine();
        cart.add_item(snapshot("p1", dec("10")), 0, None).expect("add");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_is_absolute() {
        let (_, mut cart) = engine();
        cart.add_item(snapshot("p1", dec("10")), 2, None).expect("add");
        cart.update_quantity(&ProductId::new("p1"), 7, None)
            .expect("update");

        assert_eq!(cart.items()[0].quantity, 7);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let (_, mut cart) = engine();
        cart.add_item(snapshot("p1", dec("10")), 2, None).expect("add");
        cart.update_quantity(&ProductId::new("p1"), 0, None)
            .expect("update");

        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_absent_item_is_noop() {
        let (_, mut cart) = engine();
        cart.update_quantity(&ProductId::new("missing"), 3, None)
            .expect("update");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_item_is_noop() {
        let (_, mut cart) = engine();
        cart.add_item(snapshot("p1", dec("10")), 1, None).expect("add");
        cart.remove_item(&ProductId::new("p2"), None).expect("remove");
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_remove_respects_variant_identity() {
        let (_, mut cart) = engine();
        let v1 = VariantId::new("v1");
        cart.add_item(snapshot("p1", dec("10")), 1, Some(v1.clone()))
            .expect("add");
        cart.add_item(snapshot("p1", dec("10")), 1, None).expect("add");

        cart.remove_item(&ProductId::new("p1"), Some(&v1)).expect("remove");

        assert_eq!(cart.items().len(), 1);
        assert!(cart.items()[0].variant_id.is_none());
    }

    #[test]
    fn test_subtotal_tracks_mutations() {
        let (_, mut cart) = engine();
        assert_eq!(cart.subtotal(), dec("0"));

        cart.add_item(snapshot("p1", dec("19.99")), 2, None).expect("add");
        cart.add_item(snapshot("p2", dec("5.50")), 1, None).expect("add");
        assert_eq!(cart.subtotal(), dec("45.48"));

        cart.update_quantity(&ProductId::new("p1"), 1, None)
            .expect("update");
        assert_eq!(cart.subtotal(), dec("25.49"));

        cart.remove_item(&ProductId::new("p2"), None).expect("remove");
        assert_eq!(cart.subtotal(), dec("19.99"));
    }

    #[test]
    fn test_worked_example() {
        // add(p1, 2) => one item qty 2; add(p1, 3) => qty 5; update(p1, 0) => empty.
        let (_, mut cart) = engine();
        cart.add_item(snapshot("p1", dec("4.00")), 2, None).expect("add");
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.subtotal(), dec("8.00"));

        cart.add_item(snapshot("p1", dec("4.00")), 3, None).expect("add");
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);

        cart.update_quantity(&ProductId::new("p1"), 0, None)
            .expect("update");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let (storage, mut cart) = engine();
        cart.add_item(snapshot("p2", dec("5")), 1, None).expect("add");
        cart.add_item(snapshot("p1", dec("10")), 3, Some(VariantId::new("v1")))
            .expect("add");
        drop(cart);

        let reloaded = CartEngine::load(storage);
        assert_eq!(reloaded.items().len(), 2);
        // Insertion order preserved across reload.
        assert_eq!(reloaded.items()[0].product_id, ProductId::new("p2"));
        assert_eq!(reloaded.items()[1].quantity, 3);
        assert_eq!(
            reloaded.items()[1].variant_id,
            Some(VariantId::new("v1"))
        );
        assert_eq!(reloaded.subtotal(), dec("35"));
    }

    #[test]
    fn test_clear_persists_empty_cart() {
        let (storage, mut cart) = engine();
        cart.add_item(snapshot("p1", dec("10")), 2, None).expect("add");
        cart.clear().expect("clear");
        drop(cart);

        let reloaded = CartEngine::load(storage);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        storage
            .store(storage::keys::CART, "{\"items\": 42}")
            .expect("store");

        let cart = CartEngine::load(storage);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_open_flag_is_ui_only() {
        let (storage, mut cart) = engine();
        assert!(!cart.is_open());
        cart.toggle_open();
        assert!(cart.is_open());
        cart.set_open(false);
        assert!(!cart.is_open());

        // Visibility is not part of the persisted snapshot.
        cart.toggle_open();
        drop(cart);
        let reloaded = CartEngine::load(storage);
        assert!(!reloaded.is_open());
    }
}
