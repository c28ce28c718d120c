//! # Error Types
//!
//! Domain-specific error types for ticketbooth-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ticketbooth-core errors (this file)                                   │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - One rule failure, tagged with its field path   │
//! │  └── FieldErrors      - Every failure from one form, in rule order     │
//! │                                                                         │
//! │  ticketbooth-checkout errors (separate crate)                          │
//! │  ├── GatewayError     - Payment call failures (uncategorised)          │
//! │  └── CheckoutError    - What the checkout UI sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → FieldErrors → CheckoutError → UI inline msgs  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every validation error carries the dotted field path (`items.0.quantity`)
//! 3. Errors are enum variants, never String
//! 4. Validation never panics; failures are returned as `FieldErrors`

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The entered promo code is not recognised.
    #[error("Promo code not recognised: {0}")]
    InvalidPromoCode(String),

    /// Checkout has exceeded maximum allowed line items.
    #[error("Checkout cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Quantity below what the operation allows.
    #[error("Quantity {requested} is not allowed; lines need at least 1")]
    InvalidQuantity { requested: i64 },

    /// Unit price is negative or above `MAX_UNIT_PRICE`.
    #[error("Price {price} for item {id} is out of range")]
    InvalidPrice { id: String, price: crate::money::Money },

    /// Line item was not found in the checkout.
    #[error("Item not found in checkout: {0}")]
    ItemNotFound(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single failed validation rule.
///
/// `field` is the dotted path of the offending value inside the form, e.g.
/// `campaignSettings.deadlineDate` or `items.2.quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, malformed card number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A consent checkbox was left unticked.
    #[error("{field} must be accepted")]
    MustBeAccepted { field: String },

    /// Amount is below a configured minimum.
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: String, min: String },

    /// Amount exceeds a configured cap.
    #[error("{field} cannot exceed {max}")]
    Exceeds { field: String, max: String },

    /// A derived amount does not match what was recomputed.
    #[error("{field} must equal {expected} (got {actual})")]
    Mismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Date must be strictly after the current time.
    #[error("{field} must be in the future")]
    MustBeInFuture { field: String },

    /// Date must be strictly before another date of the same form.
    #[error("{field} must be before {other}")]
    MustBeBefore { field: String, other: String },

    /// Date must be strictly after another date of the same form.
    #[error("{field} must be after {other}")]
    MustBeAfter { field: String, other: String },

    /// Collection has too few entries.
    #[error("{field} must contain at least {min} entries")]
    TooFew { field: String, min: usize },

    /// Dates in a collection are not in ascending order.
    #[error("{field} must be in chronological order")]
    NotChronological { field: String },

    /// Card or similar has lapsed.
    #[error("{field} has expired")]
    Expired { field: String },
}

impl ValidationError {
    /// Returns the dotted field path this error is attached to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::MustBeAccepted { field }
            | ValidationError::BelowMinimum { field, .. }
            | ValidationError::Exceeds { field, .. }
            | ValidationError::Mismatch { field, .. }
            | ValidationError::MustBeInFuture { field }
            | ValidationError::MustBeBefore { field, .. }
            | ValidationError::MustBeAfter { field, .. }
            | ValidationError::TooFew { field, .. }
            | ValidationError::NotChronological { field }
            | ValidationError::Expired { field } => field,
        }
    }

    /// Re-roots the error under a parent path (`quantity` → `items.0.quantity`).
    pub fn nested(mut self, parent: &str) -> Self {
        let field = match &mut self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::MustBeAccepted { field }
            | ValidationError::BelowMinimum { field, .. }
            | ValidationError::Exceeds { field, .. }
            | ValidationError::Mismatch { field, .. }
            | ValidationError::MustBeInFuture { field }
            | ValidationError::MustBeBefore { field, .. }
            | ValidationError::MustBeAfter { field, .. }
            | ValidationError::TooFew { field, .. }
            | ValidationError::NotChronological { field }
            | ValidationError::Expired { field } => field,
        };
        *field = format!("{}.{}", parent, field);
        self
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// Serializable view of one validation failure, rendered inline by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        FieldError {
            path: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Every validation failure collected from a single form.
///
/// Never empty when returned as an `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<ValidationError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        FieldErrors::default()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.errors.push(err);
    }

    /// Appends every error from `other`, re-rooted under `parent`.
    pub fn extend_nested(&mut self, parent: &str, other: FieldErrors) {
        self.errors
            .extend(other.errors.into_iter().map(|e| e.nested(parent)));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Returns true if any error is attached to exactly `path`.
    pub fn contains_field(&self, path: &str) -> bool {
        self.errors.iter().any(|e| e.field() == path)
    }

    /// Returns the errors attached to exactly `path`.
    pub fn for_field<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.field() == path)
    }

    /// Messages grouped by field path, for inline rendering.
    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for err in &self.errors {
            map.entry(err.field().to_string())
                .or_default()
                .push(err.to_string());
        }
        map
    }

    /// Flat serializable list for the frontend.
    pub fn to_field_errors(&self) -> Vec<FieldError> {
        self.errors.iter().map(FieldError::from).collect()
    }

    /// `Ok(())` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for FieldErrors {
    fn from(err: ValidationError) -> Self {
        FieldErrors { errors: vec![err] }
    }
}

impl IntoIterator for FieldErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
