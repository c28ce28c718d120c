//! # Payment Gateway
//!
//! The one await point in a checkout: turning a priced request into a hosted
//! payment page URL.
//!
//! ```text
//! CheckoutSession ──PaymentRequest──► PaymentGateway ──► CheckoutUrl
//!                                         │
//!                                         └── MockPaymentGateway (dev/tests)
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use ticketbooth_core::{Money, PaymentType};

use crate::error::GatewayError;

/// Default simulated latency of the mock gateway.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_secs(2);

// =============================================================================
// Request / Response
// =============================================================================

/// What gets charged, and for what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Money,
    /// ISO 4217 code, e.g. `USD`.
    pub currency: String,
    pub payment_type: PaymentType,
    pub description: String,
    pub product_id: Option<String>,
    pub customer_email: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Hosted payment page the buyer is redirected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckoutUrl(String);

impl CheckoutUrl {
    pub fn new(url: impl Into<String>) -> Self {
        CheckoutUrl(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckoutUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Gateway Trait
// =============================================================================

/// Creates hosted checkout pages.
///
/// Failures are returned as-is; implementations must not retry on their own.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, request: PaymentRequest) -> Result<CheckoutUrl, GatewayError>;
}

// =============================================================================
// Mock Gateway
// =============================================================================

/// Stand-in gateway: waits, records the request and hands back a fake URL.
///
/// Failures can be scripted with [`MockPaymentGateway::fail_next`]; each
/// scripted failure is consumed by one call.
pub struct MockPaymentGateway {
    delay: Duration,
    base_url: String,
    calls: Mutex<Vec<PaymentRequest>>,
    failures: Mutex<VecDeque<GatewayError>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_PAYMENT_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        MockPaymentGateway {
            delay,
            base_url: "https://checkout.ticketbooth.test".to_string(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Overrides the host used for generated URLs.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        self.failures.lock().push_back(error);
    }

    /// Number of `create_checkout` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.calls.lock().clone()
    }

    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.calls.lock().last().cloned()
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    #[instrument(skip(self, request), fields(amount = %request.amount, payment_type = %request.payment_type))]
    async fn create_checkout(&self, request: PaymentRequest) -> Result<CheckoutUrl, GatewayError> {
        self.calls.lock().push(request);
        let scripted = self.failures.lock().pop_front();

        tokio::time::sleep(self.delay).await;

        if let Some(error) = scripted {
            warn!(%error, "Mock gateway returning scripted failure");
            return Err(error);
        }

        let url = CheckoutUrl::new(format!("{}/pay/{}", self.base_url, Uuid::new_v4()));
        info!(%url, "Mock checkout created");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            amount: Money::from_cents(12_120),
            currency: "USD".to_string(),
            payment_type: PaymentType::Ticket,
            description: "General Admission x2".to_string(),
            product_id: None,
            customer_email: Some("fan@example.com".to_string()),
            user_id: None,
            metadata: BTreeMap::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_waits_and_records() {
        let gateway = MockPaymentGateway::new();
        let started = tokio::time::Instant::now();

        let url = gateway.create_checkout(request()).await.unwrap();

        assert!(started.elapsed() >= DEFAULT_PAYMENT_DELAY);
        assert!(url.as_str().starts_with("https://checkout.ticketbooth.test/pay/"));
        assert_eq!(gateway.call_count(), 1);
        assert_eq!(gateway.last_request().map(|r| r.amount.cents()), Some(12_120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_failure_is_consumed_once() {
        let gateway = MockPaymentGateway::with_delay(Duration::from_millis(10))
            .with_base_url("https://pay.example.com/");
        gateway.fail_next(GatewayError::Declined("insufficient_funds".into()));

        let err = gateway.create_checkout(request()).await.unwrap_err();
        assert_eq!(err, GatewayError::Declined("insufficient_funds".into()));

        let url = gateway.create_checkout(request()).await.unwrap();
        assert!(url.as_str().starts_with("https://pay.example.com/pay/"));
        assert_eq!(gateway.call_count(), 2);
    }
}
