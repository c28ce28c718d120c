//! Credit/funds transfer rules.

use crate::error::{FieldErrors, ValidationError};
use crate::forms::{TransferForm, TransferKind};

use super::{
    validate_future, validate_non_negative, validate_optional_text, validate_positive,
    validate_text, Rules, Validate, ValidationContext,
};

/// ## Rules
/// - `recipientId` required
/// - `amount` positive, `creditAmount` and `fundsAmount` not negative
/// - `creditAmount + fundsAmount == amount`, exactly
/// - scheduled transfers carry a `scheduledDate` in the future
impl Validate for TransferForm {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();

        rules.check(validate_text("recipientId", &self.recipient_id, 1, 64));
        rules.check(validate_positive("amount", self.amount));
        rules.check(validate_non_negative("creditAmount", self.credit_amount));
        rules.check(validate_non_negative("fundsAmount", self.funds_amount));

        let split = self.credit_amount + self.funds_amount;
        if split != self.amount {
            rules.fail(ValidationError::Mismatch {
                field: "amount".to_string(),
                expected: split.to_string(),
                actual: self.amount.to_string(),
            });
        }

        if self.kind == TransferKind::Scheduled {
            match self.scheduled_date {
                Some(date) => rules.check(validate_future("scheduledDate", date, ctx.now)),
                None => rules.fail(ValidationError::Required {
                    field: "scheduledDate".to_string(),
                }),
            }
        }

        rules.check(validate_optional_text("note", self.note.as_deref(), 500));

        rules.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::{Duration, Utc};

    fn transfer(amount: i64, credit: i64, funds: i64) -> TransferForm {
        TransferForm {
            recipient_id: "user-42".to_string(),
            amount: Money::from_cents(amount),
            credit_amount: Money::from_cents(credit),
            funds_amount: Money::from_cents(funds),
            kind: TransferKind::Immediate,
            scheduled_date: None,
            note: None,
        }
    }

    #[test]
    fn test_split_must_sum_to_amount() {
        let ctx = ValidationContext::at(Utc::now());
        assert!(transfer(5_000, 2_000, 3_000).validate(&ctx).is_ok());
        assert!(transfer(5_000, 5_000, 0).validate(&ctx).is_ok());

        let errors = transfer(5_000, 2_000, 2_000).validate(&ctx).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next().map(|e| e.to_string()),
            Some("amount must equal $40.00 (got $50.00)".to_string())
        );
    }

    #[test]
    fn test_amounts_signs() {
        let ctx = ValidationContext::at(Utc::now());
        let errors = transfer(0, 0, 0).validate(&ctx).unwrap_err();
        assert!(errors.contains_field("amount"));

        let errors = transfer(1_000, -500, 1_500).validate(&ctx).unwrap_err();
        assert!(errors.contains_field("creditAmount"));
        assert!(!errors.contains_field("amount"));
    }

    #[test]
    fn test_scheduled_transfer_needs_future_date() {
        let now = Utc::now();
        let ctx = ValidationContext::at(now);
        let mut form = transfer(5_000, 2_000, 3_000);
        form.kind = TransferKind::Scheduled;

        let errors = form.validate(&ctx).unwrap_err();
        assert!(matches!(
            errors.iter().next(),
            Some(ValidationError::Required { field }) if field == "scheduledDate"
        ));

        form.scheduled_date = Some(now - Duration::hours(1));
        assert!(form.validate(&ctx).unwrap_err().contains_field("scheduledDate"));

        form.scheduled_date = Some(now + Duration::days(7));
        assert!(form.validate(&ctx).is_ok());
    }

    #[test]
    fn test_recipient_required() {
        let ctx = ValidationContext::at(Utc::now());
        let mut form = transfer(5_000, 2_000, 3_000);
        form.recipient_id = String::new();
        assert!(form.validate(&ctx).unwrap_err().contains_field("recipientId"));
    }
}
