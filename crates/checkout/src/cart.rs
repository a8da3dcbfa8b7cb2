//! Cart ledger: the in-memory line-item collection.
//!
//! The ledger is authoritative for the browsing session; storage is a
//! best-effort mirror so the cart survives a reload. A persistence failure
//! is logged and otherwise ignored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marigold_core::{LineId, Money, ProductId};

use crate::storage::{SharedStore, keys};

/// Selected product variant. Part of the line identity key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    pub size: Option<String>,
    pub color: Option<String>,
}

/// What the catalog hands the cart when a product is added.
#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub unit_price: Money,
    /// Pre-markdown price, when the product is on sale.
    pub original_price: Option<Money>,
    /// Inline customization preview (data URL). Heavy; never persisted.
    pub artwork: Option<String>,
}

/// One cart line.
///
/// Identity key is `(product_id, size, color)` - the ledger holds at most
/// one line per identity. `line_id` is generated once and immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: LineId,
    pub product_id: ProductId,
    pub title: String,
    pub variant: Variant,
    pub unit_price: Money,
    pub original_price: Option<Money>,
    pub quantity: u32,
    /// Inline customization preview. Excluded from the persisted snapshot so
    /// a large data URL cannot blow the storage quota.
    #[serde(skip)]
    pub artwork: Option<String>,
}

impl CartLine {
    fn matches(&self, product_id: &ProductId, variant: &Variant) -> bool {
        self.product_id == *product_id && self.variant == *variant
    }

    /// Line total: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Notifications the ledger emits for collaborator UI surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEvent {
    /// An item was added; the cart drawer should open.
    DrawerOpen,
    /// Contents changed; badges and views should refresh.
    Updated,
}

/// The in-memory cart.
pub struct CartLedger {
    lines: Vec<CartLine>,
    events: Vec<CartEvent>,
    store: SharedStore,
}

impl CartLedger {
    /// Create an empty ledger over a storage tier.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self {
            lines: Vec::new(),
            events: Vec::new(),
            store,
        }
    }

    /// Restore a ledger from storage, tolerating absent or corrupt
    /// snapshots.
    #[must_use]
    pub fn load(store: SharedStore) -> Self {
        let lines = match store.get(keys::CART) {
            Ok(Some(snapshot)) => serde_json::from_str(&snapshot).unwrap_or_else(|e| {
                tracing::warn!("discarding corrupt cart snapshot: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read cart snapshot: {e}");
                Vec::new()
            }
        };
        Self {
            lines,
            events: Vec::new(),
            store,
        }
    }

    /// Add a product to the cart.
    ///
    /// Merges into the existing line when one with the same
    /// `(product_id, size, color)` identity exists; otherwise appends a new
    /// line with a fresh [`LineId`]. Emits [`CartEvent::DrawerOpen`] so the
    /// cart drawer opens on add.
    pub fn add_line(&mut self, product: &ProductSummary, qty: u32, variant: Variant) -> LineId {
        let id = self.insert(product, qty, variant);
        self.events.push(CartEvent::DrawerOpen);
        self.persist();
        id
    }

    /// [`Self::add_line`] with the drawer-open notification suppressed
    /// (bulk re-order, "buy again").
    pub fn add_line_quiet(&mut self, product: &ProductSummary, qty: u32, variant: Variant) -> LineId {
        let id = self.insert(product, qty, variant);
        self.events.push(CartEvent::Updated);
        self.persist();
        id
    }

    fn insert(&mut self, product: &ProductSummary, qty: u32, variant: Variant) -> LineId {
        let qty = qty.max(1);
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.matches(&product.id, &variant))
        {
            line.quantity += qty;
            return line.line_id;
        }

        let line = CartLine {
            line_id: LineId::new(),
            product_id: product.id.clone(),
            title: product.title.clone(),
            variant,
            unit_price: product.unit_price,
            original_price: product.original_price,
            quantity: qty,
            artwork: product.artwork.clone(),
        };
        let id = line.line_id;
        self.lines.push(line);
        id
    }

    /// Adjust a line's quantity by a signed delta.
    ///
    /// A result at or below zero is silently ignored - the line keeps its
    /// previous quantity. Removal is only ever explicit via
    /// [`Self::remove_line`]. Returns whether the update was applied.
    pub fn update_quantity(&mut self, line_id: LineId, delta: i64) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.line_id == line_id) else {
            return false;
        };

        let next = i64::from(line.quantity) + delta;
        if next <= 0 {
            tracing::debug!(%line_id, delta, "ignoring quantity update below 1");
            return false;
        }

        line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        self.events.push(CartEvent::Updated);
        self.persist();
        true
    }

    /// Remove a line.
    pub fn remove_line(&mut self, line_id: LineId) {
        let before = self.lines.len();
        self.lines.retain(|l| l.line_id != line_id);
        if self.lines.len() != before {
            self.events.push(CartEvent::Updated);
            self.persist();
        }
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        if !self.lines.is_empty() {
            self.lines.clear();
            self.events.push(CartEvent::Updated);
            self.persist();
        }
    }

    /// Sum of `unit_price x quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        let amount: Decimal = self
            .lines
            .iter()
            .map(|l| l.line_total().amount)
            .sum();
        Money::new(amount, marigold_core::CurrencyCode::USD)
    }

    /// Total item count across lines (drawer badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Current lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drain pending collaborator notifications.
    pub fn take_events(&mut self) -> Vec<CartEvent> {
        std::mem::take(&mut self.events)
    }

    /// Mirror the ledger to storage, fire-and-forget.
    fn persist(&self) {
        let snapshot = match serde_json::to_string(&self.lines) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("failed to serialize cart snapshot: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(keys::CART, &snapshot) {
            // Non-fatal: the in-memory ledger stays authoritative.
            tracing::warn!("failed to persist cart: {e}");
        }
    }
}
