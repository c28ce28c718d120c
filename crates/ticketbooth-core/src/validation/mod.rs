//! # Validation Module
//!
//! Declarative rule sets applied to every form before it reaches payment
//! submission.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript, generated bindings)                    │
//! │  ├── Shape checks (deserialization)                                    │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (required, ranges, formats)                           │
//! │  └── Cross-field rules (totals, deadlines, pledge caps, splits)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Payment gateway / hosted backend                             │
//! │  └── Whatever they enforce; not modelled here                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rule runs; failures are collected into [`FieldErrors`] so the UI can
//! render all of them inline at once. Validation never panics and never
//! reaches the network.
//!
//! ## Usage
//! ```rust
//! use ticketbooth_core::validation::{validate_quantity, validate_uuid};
//!
//! assert!(validate_quantity("quantity", 5).is_ok());
//! assert!(validate_uuid("eventId", "not-a-uuid").is_err());
//! ```

mod card;
mod checkout;
mod event;
mod pledge;
mod transfer;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FieldErrors, ValidationError};
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};

pub use card::normalize_card_number;

/// Result type for single-field validators.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Validate Trait
// =============================================================================

/// Inputs a validator may need besides the form itself.
///
/// The current time is passed in rather than read, so deadline and expiry
/// rules stay deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub now: DateTime<Utc>,
}

impl ValidationContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        ValidationContext { now }
    }
}

/// A form that can check its own business rules.
pub trait Validate {
    /// Runs every rule, returning all failures.
    fn validate(&self, ctx: &ValidationContext) -> Result<(), FieldErrors>;
}

// =============================================================================
// Rule Collector
// =============================================================================

/// Accumulates rule results for one form.
#[derive(Debug, Default)]
pub(crate) struct Rules {
    errors: FieldErrors,
}

impl Rules {
    pub(crate) fn new() -> Self {
        Rules::default()
    }

    /// Records the error, if any.
    pub(crate) fn check(&mut self, result: ValidationResult<()>) {
        if let Err(err) = result {
            self.errors.push(err);
        }
    }

    pub(crate) fn fail(&mut self, err: ValidationError) {
        self.errors.push(err);
    }

    /// Consent checkboxes must be ticked.
    pub(crate) fn accepted(&mut self, field: &str, value: bool) {
        if !value {
            self.fail(ValidationError::MustBeAccepted {
                field: field.to_string(),
            });
        }
    }

    /// Records a nested form's errors under `parent`.
    pub(crate) fn nested(&mut self, parent: &str, result: Result<(), FieldErrors>) {
        if let Err(errors) = result {
            self.errors.extend_nested(parent, errors);
        }
    }

    pub(crate) fn finish(self) -> Result<(), FieldErrors> {
        self.errors.into_result()
    }
}

// =============================================================================
// String Validators
// =============================================================================

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Validates a required text field and its length (in characters, trimmed).
///
/// ```rust
/// use ticketbooth_core::validation::validate_text;
///
/// assert!(validate_text("title", "Summer Fest", 3, 100).is_ok());
/// assert!(validate_text("title", "  ", 3, 100).is_err());
/// assert!(validate_text("title", "ab", 3, 100).is_err());
/// ```
pub fn validate_text(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional text field's maximum length.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.trim().chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Must look like `local@domain.tld` with no whitespace
pub fn validate_email(field: &str, email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 254,
        });
    }

    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string.
///
/// ```rust
/// use ticketbooth_core::validation::validate_uuid;
///
/// assert!(validate_uuid("eventId", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("eventId", "").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates an absolute `http`/`https` URL.
pub fn validate_http_url(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be an http(s) URL".to_string(),
    };

    let parsed = url::Url::parse(value).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `MAX_ITEM_QUANTITY` (999)
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price, tip, discount or similar amount.
///
/// Zero is allowed (free tickets, no tip).
///
/// ```rust
/// use ticketbooth_core::money::Money;
/// use ticketbooth_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("price", Money::from_cents(0)).is_ok());
/// assert!(validate_non_negative("price", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price: not negative and at most `MAX_UNIT_PRICE`.
///
/// ```rust
/// use ticketbooth_core::money::Money;
/// use ticketbooth_core::validation::validate_price;
///
/// assert!(validate_price("unitPrice", Money::from_cents(2_500)).is_ok());
/// assert!(validate_price("unitPrice", Money::from_cents(9_000_000_000_000_000_000)).is_err());
/// ```
pub fn validate_price(field: &str, amount: Money) -> ValidationResult<()> {
    validate_non_negative(field, amount)?;

    if amount > MAX_UNIT_PRICE {
        return Err(ValidationError::Exceeds {
            field: field.to_string(),
            max: MAX_UNIT_PRICE.to_string(),
        });
    }

    Ok(())
}

/// Validates an amount that must be strictly positive.
pub fn validate_positive(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Date must be strictly after `now`.
pub fn validate_future(field: &str, date: DateTime<Utc>, now: DateTime<Utc>) -> ValidationResult<()> {
    if date <= now {
        return Err(ValidationError::MustBeInFuture {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
