//! # Domain Types
//!
//! Core domain types shared by pricing, forms and validation.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │    ItemKind     │   │   PaymentType   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  Ticket         │   │  Ticket         │       │
//! │  │  name           │   │  Product        │   │  Product        │       │
//! │  │  quantity ≥ 1   │   │  Subscription   │   │  Subscription   │       │
//! │  │  unit_price ≥ 0 │   │  Credit         │   │  Credit, Pledge │       │
//! │  │  kind           │   └─────────────────┘   │  Donation       │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │    TaxRate      │                                                   │
//! │  │  bps (u32)      │                                                   │
//! │  │  800 = 8%       │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 800 bps = 8%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        crate::DEFAULT_TAX_RATE
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// What a checkout line is selling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Event admission.
    Ticket,
    /// Merchandise or digital product.
    Product,
    /// Creator subscription tier.
    Subscription,
    /// Platform credit top-up.
    Credit,
}

/// One line of a checkout.
///
/// The unit price is frozen when the item is added; later price changes on
/// the event or product do not affect an open checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl LineItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
        kind: ItemKind,
    ) -> Self {
        LineItem {
            id: id.into(),
            name: name.into(),
            quantity,
            unit_price,
            kind,
        }
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// Category sent to the payment endpoint with every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Ticket,
    Product,
    Subscription,
    Credit,
    Pledge,
    Donation,
}

impl From<ItemKind> for PaymentType {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Ticket => PaymentType::Ticket,
            ItemKind::Product => PaymentType::Product,
            ItemKind::Subscription => PaymentType::Subscription,
            ItemKind::Credit => PaymentType::Credit,
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentType::Ticket => "ticket",
            PaymentType::Product => "product",
            PaymentType::Subscription => "subscription",
            PaymentType::Credit => "credit",
            PaymentType::Pledge => "pledge",
            PaymentType::Donation => "donation",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tax_rate_is_eight_percent() {
        assert_eq!(TaxRate::default().bps(), 800);
        assert!((TaxRate::default().percentage() - 8.0).abs() < 0.001);
    }

    #[test]
    fn test_line_total() {
        let item = LineItem::new("t-1", "GA Ticket", Money::from_cents(2_500), 3, ItemKind::Ticket);
        assert_eq!(item.line_total().cents(), 7_500);
    }

    #[test]
    fn test_line_item_json_shape() {
        let item = LineItem::new("t-1", "GA Ticket", Money::from_cents(2_500), 1, ItemKind::Ticket);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "ticket");
        assert_eq!(json["unitPrice"], 2_500);
    }

    #[test]
    fn test_payment_type_from_item_kind() {
        assert_eq!(PaymentType::from(ItemKind::Credit), PaymentType::Credit);
        assert_eq!(PaymentType::Pledge.to_string(), "pledge");
    }
}
