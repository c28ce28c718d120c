//! # Checkout Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Validation    │  │    Payment      │  │     Session             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  FieldErrors    │  │  GatewayError   │  │  AlreadyProcessing      │ │
//! │  │  (inline, per   │  │  (shown as-is,  │  │  AlreadyCompleted       │ │
//! │  │   field path)   │  │   no retry)     │  │  RetryRequired          │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Configuration  │  ConfigError: load/save/validate checkout.toml   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use ticketbooth_core::{CoreError, FieldErrors};

use crate::session::CheckoutPhase;

/// Result type alias for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Gateway Error
// =============================================================================

/// Failure reported by a payment gateway.
///
/// Not categorised for retry: every gateway failure is shown to the buyer
/// and the session waits for an explicit retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The provider refused the payment.
    #[error("Payment declined: {0}")]
    Declined(String),

    /// The provider could not be reached.
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected the request itself.
    #[error("Payment request rejected: {0}")]
    Rejected(String),
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Everything a checkout operation can fail with.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The form failed validation. Nothing was sent to the gateway.
    #[error("Checkout form is invalid: {0}")]
    Validation(#[from] FieldErrors),

    /// The gateway call failed.
    #[error(transparent)]
    Payment(#[from] GatewayError),

    /// Cart or promo operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A submission is already in flight.
    #[error("Checkout is already being processed")]
    AlreadyProcessing,

    /// Payment already succeeded for this session.
    #[error("Checkout has already completed")]
    AlreadyCompleted,

    /// The last attempt failed; call `retry` before submitting again.
    #[error("Previous attempt failed; retry before submitting again")]
    RetryRequired,

    /// The operation only applies to another kind of checkout.
    #[error("{operation} is not available for {kind} checkout")]
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },

    /// `retry` was called outside the failed state.
    #[error("Cannot retry from {0} state")]
    NothingToRetry(CheckoutPhase),
}

impl CheckoutError {
    /// Field errors for inline display, if this was a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CheckoutError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Returns true if the gateway was called and failed.
    pub fn is_payment_failure(&self) -> bool {
        matches!(self, CheckoutError::Payment(_))
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Errors loading or validating `checkout.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No config directory available on this platform")]
    NoConfigDir,

    #[error("Invalid checkout configuration: {0}")]
    Invalid(String),
}
