//! # ticketbooth-core: Pure Pricing & Validation Logic for Ticketbooth
//!
//! This crate is the **heart** of Ticketbooth checkout. It contains the order
//! pricing engine and every form validator as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Ticketbooth Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │   Cart ──► Checkout Modal ──► Pledge Modal ──► Transfer Dialog │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ts-rs bindings                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ticketbooth-checkout                              │   │
//! │  │    CheckoutSession, PaymentGateway, fee cache, config          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ ticketbooth-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │   forms   │  │ validation│  │   │
//! │  │   │ LineItem  │  │ Breakdown │  │ Checkout  │  │  rules    │  │   │
//! │  │   │ Pledge    │  │ FeeCalc   │  │ Pledge    │  │  FieldErr │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (LineItem, TaxRate, PaymentType, etc.)
//! - [`cart`] - Line items of an open checkout
//! - [`pricing`] - Subtotal/tax/fee/tip/discount/total breakdown
//! - [`promo`] - Promo code discounts
//! - [`forms`] - Typed form payloads (checkout, pledge, event, card, transfer)
//! - [`validation`] - Business rule validation for every form
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use ticketbooth_core::money::Money;
//! use ticketbooth_core::pricing::{CardRateFeeCalculator, PricingCalculator, PricingInput};
//!
//! let input = PricingInput::new(Money::from_cents(10_000)).with_tip(Money::from_cents(1_000));
//! let breakdown = PricingCalculator::default().price(&input, &CardRateFeeCalculator::default());
//!
//! assert_eq!(breakdown.tax.cents(), 800);
//! assert_eq!(breakdown.platform_fee.cents(), 320);
//! assert_eq!(breakdown.total.cents(), 12_120);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod forms;
pub mod money;
pub mod pricing;
pub mod promo;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use error::{CoreError, CoreResult, FieldError, FieldErrors, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line item in a checkout.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum line items allowed in a single checkout.
pub const MAX_CART_ITEMS: usize = 100;

/// Highest unit price a line may carry: $1,000,000.
///
/// With `MAX_ITEM_QUANTITY` and `MAX_CART_ITEMS` this keeps every cart
/// subtotal far inside `i64` cents.
pub const MAX_UNIT_PRICE: Money = Money::from_cents(100_000_000);

/// Flat sales tax applied to every subtotal: 8%.
pub const DEFAULT_TAX_RATE: TaxRate = TaxRate::from_bps(800);

/// Allowed difference between a submitted total and the recomputed one.
pub const PRICE_TOLERANCE_CENTS: i64 = 1;

/// Smallest pledge accepted for an all-or-nothing campaign ($1.00).
pub const MIN_PLEDGE_CENTS: i64 = 100;

/// Upper bound for a referral commission, in percent.
pub const MAX_REFERRAL_COMMISSION_PERCENT: u8 = 50;
