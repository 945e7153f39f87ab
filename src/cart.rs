//! Cart collaborator interface.
//!
//! The configurator only needs somewhere to hand finished items to. The
//! storefront supplies its own [`CartSink`]; [`Cart`] is a plain in-memory
//! implementation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::item::ConfiguredItem;

/// Accepts configured items. Identity and storage are the sink's business.
pub trait CartSink {
    /// Takes ownership of `item` and returns the id assigned to it.
    fn add_item(&mut self, item: ConfiguredItem) -> String;
}

/// An item in the cart with its assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: String,
    #[serde(flatten)]
    pub item: ConfiguredItem,
}

/// In-memory cart.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    entries: Vec<CartEntry>,
    next_id: u64,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the item with `id`, returning it.
    pub fn remove(&mut self, id: &str) -> Option<ConfiguredItem> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index).item)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sum of price times quantity over all items.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.item.line_total()).sum()
    }
}

impl CartSink for Cart {
    fn add_item(&mut self, item: ConfiguredItem) -> String {
        self.next_id += 1;
        let id = format!("item-{}", self.next_id);
        debug!(%id, price = item.price, "added item to cart");
        self.entries.push(CartEntry {
            id: id.clone(),
            item,
        });
        id
    }
}
