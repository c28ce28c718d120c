//! Card entry rules. Only the shape of the input is checked; the card itself
//! is verified by the payment gateway.

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FieldErrors, ValidationError};
use crate::forms::CreditCardForm;

use super::{validate_text, Rules, Validate, ValidationContext};

static CARD_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{13,19}$").expect("card number pattern is valid"));
static EXPIRY_MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0[1-9]|1[0-2])$").expect("expiry month pattern is valid"));
static EXPIRY_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}|\d{4})$").expect("expiry year pattern is valid"));
static CVV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3,4}$").expect("cvv pattern is valid"));

/// Strips the spaces and hyphens people type between digit groups.
///
/// ```rust
/// use ticketbooth_core::validation::normalize_card_number;
///
/// assert_eq!(normalize_card_number("4242 4242-4242 4242"), "4242424242424242");
/// ```
pub fn normalize_card_number(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect()
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Expiry year as a full year; two-digit years are in the 2000s.
fn full_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(if raw.len() == 2 { 2000 + year } else { year })
}

/// ## Rules
/// - `cardholderName` required
/// - `cardNumber` 13-19 digits once spaces and hyphens are removed
/// - `expiryMonth` `01`-`12`, `expiryYear` two or four digits
/// - card usable through the end of its expiry month
/// - `cvv` 3-4 digits
impl Validate for CreditCardForm {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();

        rules.check(validate_text("cardholderName", &self.cardholder_name, 1, 100));

        let number = normalize_card_number(self.card_number.trim());
        if number.is_empty() {
            rules.fail(ValidationError::Required {
                field: "cardNumber".to_string(),
            });
        } else if !CARD_NUMBER_RE.is_match(&number) {
            rules.fail(invalid("cardNumber", "must be 13 to 19 digits"));
        }

        let month = self.expiry_month.trim();
        let year = self.expiry_year.trim();
        let month_ok = EXPIRY_MONTH_RE.is_match(month);
        let year_ok = EXPIRY_YEAR_RE.is_match(year);
        if !month_ok {
            rules.fail(invalid("expiryMonth", "must be 01 to 12"));
        }
        if !year_ok {
            rules.fail(invalid("expiryYear", "must be two or four digits"));
        }

        if month_ok && year_ok {
            let expiry = month.parse::<u32>().ok().zip(full_year(year));
            if let Some((month, year)) = expiry {
                if (year, month) < (ctx.now.year(), ctx.now.month()) {
                    rules.fail(ValidationError::Expired {
                        field: "expiryYear".to_string(),
                    });
                }
            }
        }

        if !CVV_RE.is_match(self.cvv.trim()) {
            rules.fail(invalid("cvv", "must be 3 or 4 digits"));
        }

        rules.finish()
    }
}
