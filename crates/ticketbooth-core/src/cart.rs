//! # Cart
//!
//! The line items of an open checkout.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Operations                                  │
//! │                                                                         │
//! │  Pick ticket tier ───────► add_item() ────────► items.push(item)       │
//! │  Pick same tier again ───► add_item() ────────► items[i].qty += n      │
//! │  Change quantity ────────► update_quantity() ─► items[i].qty = n       │
//! │  Remove line ────────────► remove_item() ─────► items.remove(i)        │
//! │                                                                         │
//! │  Every change invalidates the pricing breakdown; the checkout session  │
//! │  reprices after each call.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Items are unique by `id` (adding the same id increases quantity)
//! - Quantity is 1..=`MAX_ITEM_QUANTITY`; setting it to 0 removes the line
//! - Unit price is 0..=`MAX_UNIT_PRICE`
//! - At most `MAX_CART_ITEMS` distinct lines

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::LineItem;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Builds a cart from existing lines, merging duplicate ids.
    pub fn from_items(items: impl IntoIterator<Item = LineItem>) -> CoreResult<Self> {
        let mut cart = Cart::new();
        for item in items {
            cart.add_item(item)?;
        }
        Ok(cart)
    }

    /// Adds a line or increases the quantity of an existing line with the same id.
    pub fn add_item(&mut self, item: LineItem) -> CoreResult<()> {
        if item.quantity < 1 {
            return Err(CoreError::InvalidQuantity {
                requested: item.quantity,
            });
        }
        if item.unit_price.is_negative() || item.unit_price > MAX_UNIT_PRICE {
            return Err(CoreError::InvalidPrice {
                id: item.id,
                price: item.unit_price,
            });
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            let new_qty = existing.quantity.saturating_add(item.quantity);
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: item.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        self.items.push(item);
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(id);
        }

        if quantity < 0 {
            return Err(CoreError::InvalidQuantity {
                requested: quantity,
            });
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::ItemNotFound(id.to_string())),
        }
    }

    pub fn remove_item(&mut self, id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.id != id);

        if self.items.len() == initial_len {
            Err(CoreError::ItemNotFound(id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().fold(0i64, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Sum of all line totals, before tax, fees, tip and discount.
    pub fn subtotal(&self) -> Money {
        crate::pricing::subtotal_of(&self.items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
