//! # Pricing Module
//!
//! Derives the price breakdown shown in every checkout, pledge and
//! subscription modal.
//!
//! ## Breakdown
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal      Σ unit_price × quantity                                 │
//! │  + tax         subtotal × 8% (flat, no jurisdictions)                  │
//! │  + fee         FeeCalculator quote, or $0 in platform-fee mode         │
//! │  + tip         buyer's choice, ≥ 0                                      │
//! │  - discount    promo discount, ≥ 0, never more than the gross          │
//! │  ───────────                                                            │
//! │  = total                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The breakdown has no lifecycle of its own: it is recomputed from its
//! inputs whenever a line item, the tip or the discount changes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{LineItem, TaxRate};
use crate::PRICE_TOLERANCE_CENTS;

// =============================================================================
// Fee Calculator
// =============================================================================

/// Request sent to a fee calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FeeRequest {
    pub amount: Money,
    /// Operator absorbs the processor fee.
    pub is_platform_fee: bool,
    pub include_stripe_fees: bool,
}

/// Fees quoted for an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    /// Card processor fee.
    pub stripe_fee: Money,
    /// Operator's cut.
    pub platform_fee: Money,
    /// What the seller receives.
    pub net_amount: Money,
}

/// Quotes payment processing fees for an amount.
///
/// Implementations must be pure: the same request always yields the same
/// quote. `ticketbooth-checkout` relies on that to cache quotes.
pub trait FeeCalculator {
    fn quote(&self, request: &FeeRequest) -> FeeQuote;
}

impl<T: FeeCalculator + ?Sized> FeeCalculator for &T {
    fn quote(&self, request: &FeeRequest) -> FeeQuote {
        (**self).quote(request)
    }
}

/// Typical card rates: a percentage plus a fixed amount per charge.
///
/// ```rust
/// use ticketbooth_core::money::Money;
/// use ticketbooth_core::pricing::{CardRateFeeCalculator, FeeCalculator, FeeRequest};
///
/// let quote = CardRateFeeCalculator::default().quote(&FeeRequest {
///     amount: Money::from_cents(10_000),
///     is_platform_fee: false,
///     include_stripe_fees: true,
/// });
/// assert_eq!(quote.stripe_fee.cents(), 320); // 2.9% + 30¢
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRateFeeCalculator {
    pub percent_bps: u32,
    pub fixed: Money,
    /// Operator's cut in basis points.
    pub platform_bps: u32,
}

impl Default for CardRateFeeCalculator {
    fn default() -> Self {
        CardRateFeeCalculator {
            percent_bps: 290,
            fixed: Money::from_cents(30),
            platform_bps: 0,
        }
    }
}

impl FeeCalculator for CardRateFeeCalculator {
    fn quote(&self, request: &FeeRequest) -> FeeQuote {
        let amount = request.amount;
        if !amount.is_positive() {
            return FeeQuote {
                net_amount: amount,
                ..FeeQuote::default()
            };
        }

        let stripe_fee = if request.include_stripe_fees {
            amount.percentage_bps(self.percent_bps) + self.fixed
        } else {
            Money::zero()
        };
        let platform_fee = amount.percentage_bps(self.platform_bps);

        // In platform-fee mode the seller's payout carries the processor fee.
        let net_amount = if request.is_platform_fee {
            amount - stripe_fee - platform_fee
        } else {
            amount - platform_fee
        };

        FeeQuote {
            stripe_fee,
            platform_fee,
            net_amount,
        }
    }
}

// =============================================================================
// Pricing Input / Breakdown
// =============================================================================

/// Everything the price of a checkout depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingInput {
    pub subtotal: Money,
    #[serde(default)]
    pub tip: Money,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub is_platform_fee: bool,
}

impl PricingInput {
    pub fn new(subtotal: Money) -> Self {
        PricingInput {
            subtotal,
            ..PricingInput::default()
        }
    }

    pub fn with_tip(mut self, tip: Money) -> Self {
        self.tip = tip;
        self
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_platform_fee(mut self, is_platform_fee: bool) -> Self {
        self.is_platform_fee = is_platform_fee;
        self
    }
}

/// Derived price breakdown.
///
/// ## Invariant
/// `total == subtotal + tax + platform_fee + tip - discount`, within
/// `PRICE_TOLERANCE_CENTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    /// Processing fee passed to the buyer (zero in platform-fee mode).
    pub platform_fee: Money,
    pub tip: Money,
    pub discount: Money,
    pub total: Money,
}

impl PricingBreakdown {
    /// Recomputes the total from the components.
    pub fn expected_total(&self) -> Money {
        self.subtotal + self.tax + self.platform_fee + self.tip - self.discount
    }

    /// Returns true when `total` matches the components within tolerance.
    pub fn is_consistent(&self) -> bool {
        self.total.abs_diff(self.expected_total()).cents() <= PRICE_TOLERANCE_CENTS
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Sum of line totals.
pub fn subtotal_of(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::line_total).sum()
}

/// Sum of line totals, or `None` if any product or the sum overflows.
pub fn checked_subtotal_of(items: &[LineItem]) -> Option<Money> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        acc.checked_add(item.unit_price.checked_multiply_quantity(item.quantity)?)
    })
}

/// Flat-rate pricing calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PricingCalculator {
    tax_rate: TaxRate,
}

impl PricingCalculator {
    pub fn with_tax_rate(tax_rate: TaxRate) -> Self {
        PricingCalculator { tax_rate }
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Computes the breakdown for `input`.
    ///
    /// Never fails. Negative inputs are treated as zero, and the discount is
    /// capped at the pre-discount total so the total never goes negative.
    pub fn price<F: FeeCalculator + ?Sized>(&self, input: &PricingInput, fees: &F) -> PricingBreakdown {
        let subtotal = input.subtotal.max(Money::zero());
        let tip = input.tip.max(Money::zero());
        let tax = subtotal.calculate_tax(self.tax_rate);

        let processing_fee = if input.is_platform_fee {
            Money::zero()
        } else {
            fees.quote(&FeeRequest {
                amount: subtotal,
                is_platform_fee: false,
                include_stripe_fees: true,
            })
            .stripe_fee
        };

        let gross = subtotal + tax + processing_fee + tip;
        let discount = input.discount.max(Money::zero()).min(gross);

        PricingBreakdown {
            subtotal,
            tax,
            platform_fee: processing_fee,
            tip,
            discount,
            total: gross - discount,
        }
    }

    /// Prices a set of line items.
    pub fn price_items<F: FeeCalculator + ?Sized>(
        &self,
        items: &[LineItem],
        tip: Money,
        discount: Money,
        is_platform_fee: bool,
        fees: &F,
    ) -> PricingBreakdown {
        let input = PricingInput {
            subtotal: subtotal_of(items),
            tip,
            discount,
            is_platform_fee,
        };
        self.price(&input, fees)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;

    fn calc() -> PricingCalculator {
        PricingCalculator::default()
    }

    #[test]
    fn test_hundred_dollar_cart_with_tip() {
        let fees = CardRateFeeCalculator::default();
        let input = PricingInput::new(Money::from_cents(10_000)).with_tip(Money::from_cents(1_000));

        let with_tip = calc().price(&input, &fees);
        assert_eq!(with_tip.tax.cents(), 800);
        assert_eq!(with_tip.platform_fee.cents(), 320);
        assert_eq!(with_tip.total.cents(), 12_120);

        let no_tip = calc().price(&input.with_tip(Money::zero()), &fees);
        assert_eq!(no_tip.total.cents(), 11_120);
        assert_eq!((with_tip.total - no_tip.total).cents(), 1_000);
    }

    #[test]
    fn test_platform_fee_mode_absorbs_processing_fee() {
        let input = PricingInput::new(Money::from_cents(10_000)).with_platform_fee(true);
        let breakdown = calc().price(&input, &CardRateFeeCalculator::default());
        assert!(breakdown.platform_fee.is_zero());
        assert_eq!(breakdown.total.cents(), 10_800);
    }

    #[test]
    fn test_discount_is_subtracted() {
        let input = PricingInput::new(Money::from_cents(10_000)).with_discount(Money::from_cents(1_000));
        let breakdown = calc().price(&input, &CardRateFeeCalculator::default());
        assert_eq!(breakdown.discount.cents(), 1_000);
        assert_eq!(breakdown.total.cents(), 10_120);
    }

    #[test]
    fn test_discount_capped_at_gross() {
        let input = PricingInput::new(Money::from_cents(1_000))
            .with_platform_fee(true)
            .with_discount(Money::from_cents(50_000));
        let breakdown = calc().price(&input, &CardRateFeeCalculator::default());
        assert_eq!(breakdown.discount.cents(), 1_080);
        assert!(breakdown.total.is_zero());
        assert!(breakdown.is_consistent());
    }

    #[test]
    fn test_free_checkout_has_no_fee() {
        let breakdown = calc().price(&PricingInput::new(Money::zero()), &CardRateFeeCalculator::default());
        assert_eq!(breakdown, PricingBreakdown::default());
    }

    #[test]
    fn test_total_invariant_holds_across_inputs() {
        let fees = CardRateFeeCalculator::default();
        for subtotal in [0, 1, 99, 1_234, 10_000, 987_654] {
            for tip in [0, 1, 500, 10_000] {
                for is_platform_fee in [false, true] {
                    let base = calc().price(
                        &PricingInput::new(Money::from_cents(subtotal))
                            .with_tip(Money::from_cents(tip))
                            .with_platform_fee(is_platform_fee),
                        &fees,
                    );
                    for discount in [0, base.total.cents() / 3, base.total.cents()] {
                        let b = calc().price(
                            &PricingInput::new(Money::from_cents(subtotal))
                                .with_tip(Money::from_cents(tip))
                                .with_discount(Money::from_cents(discount))
                                .with_platform_fee(is_platform_fee),
                            &fees,
                        );
                        assert!(b.is_consistent(), "inconsistent breakdown: {:?}", b);
                        assert_eq!(b.discount.cents(), discount);
                    }
                }
            }
        }
    }

    #[test]
    fn test_price_items() {
        let items = vec![
            LineItem::new("ga", "GA", Money::from_cents(2_500), 2, ItemKind::Ticket),
            LineItem::new("tee", "T-Shirt", Money::from_cents(5_000), 1, ItemKind::Product),
        ];
        let breakdown = calc().price_items(
            &items,
            Money::zero(),
            Money::zero(),
            false,
            &CardRateFeeCalculator::default(),
        );
        assert_eq!(breakdown.subtotal.cents(), 10_000);
        assert_eq!(breakdown.total.cents(), 11_120);
    }

    #[test]
    fn test_overflowing_items() {
        let items = vec![
            LineItem::new("ga", "GA", Money::from_cents(2), i64::MAX, ItemKind::Ticket),
            LineItem::new("tee", "T-Shirt", Money::from_cents(5_000), 1, ItemKind::Product),
        ];
        assert_eq!(checked_subtotal_of(&items), None);
        assert_eq!(checked_subtotal_of(&items[1..]), Some(Money::from_cents(5_000)));

        let breakdown = calc().price_items(
            &items,
            Money::zero(),
            Money::zero(),
            false,
            &CardRateFeeCalculator::default(),
        );
        assert_eq!(breakdown.total, Money::from_cents(i64::MAX));
        assert!(breakdown.is_consistent());
    }

    #[test]
    fn test_fee_quote_net_amount() {
        let fees = CardRateFeeCalculator {
            platform_bps: 500,
            ..CardRateFeeCalculator::default()
        };
        let absorbed = fees.quote(&FeeRequest {
            amount: Money::from_cents(10_000),
            is_platform_fee: true,
            include_stripe_fees: true,
        });
        assert_eq!(absorbed.platform_fee.cents(), 500);
        assert_eq!(absorbed.net_amount.cents(), 10_000 - 320 - 500);

        let passed_on = fees.quote(&FeeRequest {
            amount: Money::from_cents(10_000),
            is_platform_fee: false,
            include_stripe_fees: false,
        });
        assert!(passed_on.stripe_fee.is_zero());
        assert_eq!(passed_on.net_amount.cents(), 9_500);
    }

    #[test]
    fn test_inconsistent_breakdown_detected() {
        let mut b = calc().price(&PricingInput::new(Money::from_cents(10_000)), &CardRateFeeCalculator::default());
        b.total += Money::from_cents(1);
        assert!(b.is_consistent());
        b.total += Money::from_cents(1);
        assert!(!b.is_consistent());
    }
}
