//! Offline price quotes, as used by the `quote` binary.

use serde::{Deserialize, Serialize};

use ticketbooth_core::cart::Cart;
use ticketbooth_core::pricing::{FeeCalculator, PricingBreakdown, PricingCalculator, PricingInput};
use ticketbooth_core::promo::{AppliedPromo, PromoCode};
use ticketbooth_core::validation::validate_non_negative;
use ticketbooth_core::{FieldErrors, LineItem, Money, TaxRate};

use crate::config::CheckoutConfig;
use crate::error::CheckoutResult;

/// Input file for `quote`.
///
/// ```json
/// {
///   "items": [{ "id": "ga", "name": "GA", "quantity": 2, "unitPrice": 5000, "type": "ticket" }],
///   "tip": 1000,
///   "promoCode": "SAVE10"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub tip: Money,
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Falls back to the configured platform-fee mode.
    #[serde(default)]
    pub is_platform_fee: Option<bool>,
    /// Falls back to the configured tax rate.
    #[serde(default)]
    pub tax_rate_bps: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub currency: String,
    pub promo_code: Option<PromoCode>,
    pub breakdown: PricingBreakdown,
}

impl QuoteRequest {
    /// Prices the request. Fails on a negative tip, an unknown promo code,
    /// or a cart with out-of-range quantities or prices.
    pub fn quote<F: FeeCalculator + ?Sized>(
        &self,
        config: &CheckoutConfig,
        fees: &F,
    ) -> CheckoutResult<QuoteResponse> {
        validate_non_negative("tip", self.tip).map_err(FieldErrors::from)?;
        let cart = Cart::from_items(self.items.iter().cloned())?;

        let mut promo = AppliedPromo::none();
        if let Some(code) = self.promo_code.as_deref().filter(|c| !c.trim().is_empty()) {
            promo.apply(code)?;
        }

        let calculator = match self.tax_rate_bps {
            Some(bps) => PricingCalculator::with_tax_rate(TaxRate::from_bps(bps)),
            None => config.pricing_calculator(),
        };

        let subtotal = cart.subtotal();
        let input = PricingInput::new(subtotal)
            .with_tip(self.tip)
            .with_discount(promo.discount_for(subtotal))
            .with_platform_fee(self.is_platform_fee.unwrap_or(config.pricing.platform_fee_mode));

        Ok(QuoteResponse {
            currency: config.pricing.currency.clone(),
            promo_code: promo.code(),
            breakdown: calculator.price(&input, fees),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckoutError;
    use ticketbooth_core::pricing::CardRateFeeCalculator;
    use ticketbooth_core::CoreError;

    fn parse(json: &str) -> QuoteRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_quote_from_json() {
        let request = parse(
            r#"{
                "items": [{ "id": "ga", "name": "GA", "quantity": 2, "unitPrice": 5000, "type": "ticket" }],
                "tip": 1000
            }"#,
        );
        let response = request
            .quote(&CheckoutConfig::default(), &CardRateFeeCalculator::default())
            .unwrap();

        assert_eq!(response.currency, "USD");
        assert_eq!(response.breakdown.total.cents(), 12_120);
        assert!(response.breakdown.is_consistent());
    }

    #[test]
    fn test_quote_with_promo_and_overrides() {
        let request = parse(
            r#"{
                "items": [{ "id": "ga", "name": "GA", "quantity": 1, "unitPrice": 10000, "type": "ticket" }],
                "promoCode": "SAVE10",
                "isPlatformFee": true,
                "taxRateBps": 0
            }"#,
        );
        let response = request
            .quote(&CheckoutConfig::default(), &CardRateFeeCalculator::default())
            .unwrap();

        assert_eq!(response.promo_code, Some(PromoCode::Save10));
        assert_eq!(response.breakdown.total.cents(), 9_000);
    }

    #[test]
    fn test_unknown_promo_fails() {
        let request = parse(r#"{ "items": [], "promoCode": "HALFOFF" }"#);
        let err = request
            .quote(&CheckoutConfig::default(), &CardRateFeeCalculator::default())
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(_)));
    }

    #[test]
    fn test_out_of_range_amounts_fail_cleanly() {
        let request = parse(
            r#"{
                "items": [{ "id": "ga", "name": "GA", "quantity": 2, "unitPrice": 9000000000000000000, "type": "ticket" }]
            }"#,
        );
        let err = request
            .quote(&CheckoutConfig::default(), &CardRateFeeCalculator::default())
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::InvalidPrice { .. })));

        let request = parse(
            r#"{
                "items": [{ "id": "ga", "name": "GA", "quantity": 1, "unitPrice": 5000, "type": "ticket" }],
                "tip": -100
            }"#,
        );
        let err = request
            .quote(&CheckoutConfig::default(), &CardRateFeeCalculator::default())
            .unwrap_err();
        assert!(err.field_errors().is_some_and(|e| e.contains_field("tip")));
    }

    #[test]
    fn test_huge_tip_saturates_instead_of_panicking() {
        let request = parse(
            r#"{
                "items": [{ "id": "ga", "name": "GA", "quantity": 1, "unitPrice": 5000, "type": "ticket" }],
                "tip": 9223372036854775807
            }"#,
        );
        let response = request
            .quote(&CheckoutConfig::default(), &CardRateFeeCalculator::default())
            .unwrap();
        assert_eq!(response.breakdown.total, Money::from_cents(i64::MAX));
        assert!(response.breakdown.is_consistent());
    }
}
