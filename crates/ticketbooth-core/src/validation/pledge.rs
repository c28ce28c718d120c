//! Pledge rules for all-or-nothing campaigns.

use crate::error::{FieldErrors, ValidationError};
use crate::forms::PledgeForm;
use crate::money::Money;
use crate::MIN_PLEDGE_CENTS;

use super::{validate_email, validate_quantity, validate_uuid, Rules, Validate, ValidationContext};

/// ## Rules
/// - `eventId` is a UUID
/// - `pledgeAmount` ≥ $1.00
/// - with `maxPledgeAmount` set and overpledge disallowed, `pledgeAmount ≤ maxPledgeAmount`
/// - `ticketQuantity` in 1..=999
/// - `understandPledgeTerms` and `acceptCancellationPolicy` ticked
impl Validate for PledgeForm {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();

        rules.check(validate_uuid("eventId", &self.event_id));

        let min = Money::from_cents(MIN_PLEDGE_CENTS);
        if self.pledge_amount < min {
            rules.fail(ValidationError::BelowMinimum {
                field: "pledgeAmount".to_string(),
                min: min.to_string(),
            });
        }

        if let Some(max) = self.max_pledge_amount {
            if !max.is_positive() {
                rules.fail(ValidationError::MustBePositive {
                    field: "maxPledgeAmount".to_string(),
                });
            } else if !self.allow_overpledge && self.pledge_amount > max {
                rules.fail(ValidationError::Exceeds {
                    field: "pledgeAmount".to_string(),
                    max: max.to_string(),
                });
            }
        }

        rules.check(validate_quantity("ticketQuantity", self.ticket_quantity));

        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            rules.check(validate_email("email", email));
        }

        rules.accepted("understandPledgeTerms", self.understand_pledge_terms);
        rules.accepted("acceptCancellationPolicy", self.accept_cancellation_policy);

        rules.finish()
    }
}
