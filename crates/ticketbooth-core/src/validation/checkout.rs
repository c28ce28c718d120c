//! Checkout, quick checkout and subscription rules.

use crate::error::{FieldErrors, ValidationError};
use crate::forms::{
    CheckoutForm, CheckoutRequest, ContactDetails, QuickCheckoutForm, SubscriptionForm,
};
use crate::pricing::checked_subtotal_of;
use crate::promo::PromoCode;
use crate::types::LineItem;
use crate::MAX_CART_ITEMS;

use super::{
    validate_email, validate_non_negative, validate_optional_text, validate_price,
    validate_quantity, validate_text, validate_uuid, Rules, Validate, ValidationContext,
};

impl Validate for ContactDetails {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();
        rules.check(validate_text("name", &self.name, 1, 100));
        rules.check(validate_email("email", &self.email));
        rules.check(validate_optional_text("phone", self.phone.as_deref(), 32));
        rules.finish()
    }
}

impl Validate for LineItem {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();
        rules.check(validate_text("id", &self.id, 1, 64));
        rules.check(validate_text("name", &self.name, 1, 200));
        rules.check(validate_quantity("quantity", self.quantity));
        rules.check(validate_price("unitPrice", self.unit_price));
        rules.finish()
    }
}

/// ## Rules
/// - `items` non-empty, at most `MAX_CART_ITEMS`, each line valid
/// - `subtotal` equals the sum of line totals (checked only when every line
///   is valid, so out-of-range lines never reach the arithmetic)
/// - `tip`, `discount` not negative
/// - `total` equals `subtotal + tax + platformFee + tip - discount` within one cent
/// - `promoCode`, when present, is recognised
/// - `acceptTerms` and `acceptRefundPolicy` ticked
impl Validate for CheckoutForm {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();

        if self.items.is_empty() {
            rules.fail(ValidationError::Required {
                field: "items".to_string(),
            });
        } else if self.items.len() > MAX_CART_ITEMS {
            rules.fail(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_CART_ITEMS as i64,
            });
        }

        let mut lines_valid = true;
        for (i, item) in self.items.iter().enumerate() {
            let result = item.validate(ctx);
            lines_valid &= result.is_ok();
            rules.nested(&format!("items.{}", i), result);
        }

        rules.check(validate_non_negative("subtotal", self.subtotal));
        rules.check(validate_non_negative("tax", self.tax));
        rules.check(validate_non_negative("platformFee", self.platform_fee));
        rules.check(validate_non_negative("tip", self.tip));
        rules.check(validate_non_negative("discount", self.discount));

        if lines_valid {
            if let Some(items_subtotal) =
                checked_subtotal_of(&self.items).filter(|s| *s != self.subtotal)
            {
                rules.fail(ValidationError::Mismatch {
                    field: "subtotal".to_string(),
                    expected: items_subtotal.to_string(),
                    actual: self.subtotal.to_string(),
                });
            }
        }

        let breakdown = self.submitted_breakdown();
        if !breakdown.is_consistent() {
            rules.fail(ValidationError::Mismatch {
                field: "total".to_string(),
                expected: breakdown.expected_total().to_string(),
                actual: self.total.to_string(),
            });
        }

        if let Some(code) = self.promo_code.as_deref().filter(|c| !c.trim().is_empty()) {
            if PromoCode::parse(code).is_none() {
                rules.fail(ValidationError::InvalidFormat {
                    field: "promoCode".to_string(),
                    reason: "is not a recognised promo code".to_string(),
                });
            }
        }

        rules.nested("contact", self.contact.validate(ctx));
        rules.accepted("acceptTerms", self.accept_terms);
        rules.accepted("acceptRefundPolicy", self.accept_refund_policy);

        rules.finish()
    }
}

impl Validate for QuickCheckoutForm {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();
        rules.check(validate_uuid("productId", &self.product_id));
        rules.check(validate_text("productName", &self.product_name, 1, 200));
        rules.check(validate_price("unitPrice", self.unit_price));
        rules.check(validate_quantity("quantity", self.quantity));
        rules.check(validate_email("email", &self.email));
        rules.accepted("acceptTerms", self.accept_terms);
        rules.finish()
    }
}

impl Validate for SubscriptionForm {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();
        rules.check(validate_text("tierId", &self.tier_id, 1, 64));
        rules.check(validate_text("tierName", &self.tier_name, 1, 100));
        rules.check(validate_price("price", self.price));
        rules.check(validate_email("email", &self.email));
        rules.accepted("acceptTerms", self.accept_terms);
        rules.finish()
    }
}

impl Validate for CheckoutRequest {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), FieldErrors> {
        match self {
            CheckoutRequest::Cart(form) => form.validate(ctx),
            CheckoutRequest::Quick(form) => form.validate(ctx),
            CheckoutRequest::Pledge(form) => form.validate(ctx),
            CheckoutRequest::Subscription(form) => form.validate(ctx),
        }
    }
}
