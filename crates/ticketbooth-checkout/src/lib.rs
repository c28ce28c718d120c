//! # ticketbooth-checkout: Checkout Orchestration for Ticketbooth
//!
//! Takes a form from `ticketbooth-core`, keeps its price current while the
//! buyer edits it, and submits it to a payment gateway.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 CheckoutSession (one per modal)                  │  │
//! │  │                                                                  │  │
//! │  │  CheckoutRequest ─► PricingCalculator ─► PricingBreakdown        │  │
//! │  │  Validate ─► PaymentGateway::create_checkout ─► CheckoutUrl      │  │
//! │  └──────────────┬──────────────────────────────┬────────────────────┘  │
//! │                 │                              │                        │
//! │                 ▼                              ▼                        │
//! │  ┌────────────────────────────┐  ┌────────────────────────────────┐    │
//! │  │ CachingFeeCalculator       │  │ PaymentGateway                 │    │
//! │  │  └── TtlCache (injected)   │  │  └── MockPaymentGateway        │    │
//! │  └────────────────────────────┘  └────────────────────────────────┘    │
//! │                                                                         │
//! │  CheckoutListener receives on_success(url) / on_error(err)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`session`] - `CheckoutSession` state machine
//! - [`gateway`] - Payment gateway trait and mock
//! - [`cache`] - Bounded TTL cache
//! - [`fees`] - Fee quote memoisation
//! - [`config`] - Checkout configuration (TOML + env)
//! - [`quote`] - Offline quotes for the `quote` binary
//! - [`error`] - Checkout error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ticketbooth_checkout::{CheckoutConfig, CheckoutSession, CachingFeeCalculator};
//!
//! let config = CheckoutConfig::load_or_default(None);
//! let fees = CachingFeeCalculator::new(CardRateFeeCalculator::default(), Arc::new(config.build_fee_cache()));
//! let mut session = CheckoutSession::from_config(request, &config, Arc::new(config.build_mock_gateway()), Arc::new(fees));
//!
//! session.apply_promo_code("SAVE10")?;
//! let url = session.submit(&ValidationContext::at(Utc::now())).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod fees;
pub mod gateway;
pub mod quote;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::TtlCache;
pub use config::CheckoutConfig;
pub use error::{CheckoutError, CheckoutResult, ConfigError, GatewayError};
pub use fees::{CachingFeeCalculator, FeeCache, FeeCacheStats};
pub use gateway::{CheckoutUrl, MockPaymentGateway, PaymentGateway, PaymentRequest};
pub use quote::{QuoteRequest, QuoteResponse};
pub use session::{CheckoutListener, CheckoutPhase, CheckoutSession, NoOpListener};
