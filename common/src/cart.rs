use serde::{Deserialize, Serialize};

/// Highest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// A line in the shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub title: String,
    /// Unit price in whole kronor.
    pub price: u64,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

/// Shopping cart, persisted under [`Cart::STORAGE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub const STORAGE_KEY: &'static str = "cart.items";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Add `qty` of an item, merging with an existing line by id.
    pub fn add(&mut self, mut item: CartItem, qty: u32) {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(qty).min(MAX_LINE_QUANTITY);
            }
            None => {
                item.quantity = qty.clamp(1, MAX_LINE_QUANTITY);
                self.items.push(item);
            }
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.items.retain(|i| i.id != id);
    }

    /// Set a line's quantity, clamped to `1..=99`. Unknown ids are ignored.
    pub fn set_quantity(&mut self, id: &str, qty: u32) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = qty.clamp(1, MAX_LINE_QUANTITY);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> u64 {
        self.items.iter().map(|i| i.price * u64::from(i.quantity)).sum()
    }

    pub fn count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
