//! # Money Module
//!
//! Provides the `Money` type used for every price, fee, tip and pledge.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CHECKOUT TOTALS IN FLOATING POINT                                      │
//! │                                                                         │
//! │    subtotal 100.00 + tax 8.00 + fee 3.2 + tip 0.1                       │
//! │      = 111.30000000000001                                               │
//! │                                                                         │
//! │  A float checkout has to compare totals "within 0.01".                 │
//! │                                                                         │
//! │  Integer cents:                                                        │
//! │    10000 + 800 + 320 + 10 = 11130                                       │
//! │  The only tolerance left is the one cent a rounded fee may shift.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ticketbooth_core::money::Money;
//!
//! let ticket = Money::from_cents(2_500); // $25.00
//! let pair = ticket * 2i64;              // $50.00
//! let with_tip = pair + Money::from_major_minor(5, 0);
//! assert_eq!(with_tip.cents(), 5_500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Where Money Flows
/// ```text
/// LineItem.unit_price ──► LineItem.line_total ──► subtotal
///                                                   │
///      tax (8%) ◄───────────────────────────────────┤
///      processing fee (FeeCalculator) ◄─────────────┤
///      discount (promo) ◄───────────────────────────┘
///                                                   │
///      total = subtotal + tax + fee + tip - discount ──► PaymentRequest.amount
/// ```
///
/// Operators saturate at the `i64` bounds rather than panicking; amounts that
/// large are rejected by validation long before they reach a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use ticketbooth_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major.saturating_mul(100).saturating_sub(minor))
        } else {
            Money(major.saturating_mul(100).saturating_add(minor))
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Absolute difference between two amounts, used for total tolerance checks.
    #[inline]
    pub fn abs_diff(&self, other: Money) -> Money {
        Money(i64::try_from(self.0.abs_diff(other.0)).unwrap_or(i64::MAX))
    }

    /// Calculates tax at a flat rate, rounding half up to the nearest cent.
    ///
    /// ```rust
    /// use ticketbooth_core::money::Money;
    /// use ticketbooth_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(10_000); // $100.00
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(800)); // 8%
    /// assert_eq!(tax.cents(), 800);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage_bps(rate.bps())
    }

    /// Returns `bps` basis points of this amount, rounded half up.
    ///
    /// i128 keeps large subtotals from overflowing the intermediate product.
    ///
    /// ```rust
    /// use ticketbooth_core::money::Money;
    ///
    /// let amount = Money::from_cents(10_000);
    /// assert_eq!(amount.percentage_bps(290).cents(), 290); // 2.9%
    /// assert_eq!(Money::from_cents(1_005).percentage_bps(1_000).cents(), 101);
    /// ```
    pub fn percentage_bps(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Multiplies a unit price by a quantity, saturating at the i64 bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies a unit price by a quantity, or `None` on overflow.
    ///
    /// ```rust
    /// use ticketbooth_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(250).checked_multiply_quantity(4), Some(Money::from_cents(1_000)));
    /// assert_eq!(Money::from_cents(2).checked_multiply_quantity(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtracts, stopping at zero.
    ///
    /// ```rust
    /// use ticketbooth_core::money::Money;
    ///
    /// let gross = Money::from_cents(500);
    /// assert_eq!(gross.saturating_sub(Money::from_cents(800)), Money::zero());
    /// ```
    #[inline]
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly dollar formatting. Localised display is the frontend's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
