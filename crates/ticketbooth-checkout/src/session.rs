//! # Checkout Session
//!
//! Owns one open checkout: the form, its live price, the applied promo and
//! where the submission stands.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │          submit()                     gateway ok                        │
//! │   Idle ───────────► Validating ──┬──► Submitting ──┬──► Success         │
//! │    ▲                             │                 │                    │
//! │    │      invalid form           │                 │ gateway error      │
//! │    ├─────────────────────────────┘                 ▼                    │
//! │    │                                            Failed                  │
//! │    └──────────────────── retry() ──────────────────┘                    │
//! │                                                                         │
//! │  Submitting is the only suspend point. submit() while Submitting or     │
//! │  Success is rejected; from Failed it needs retry() first.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every edit (tip, promo, items, platform-fee mode) recomputes the
//! breakdown immediately, so what the buyer sees is what gets charged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use ticketbooth_core::cart::Cart;
use ticketbooth_core::forms::CheckoutRequest;
use ticketbooth_core::pricing::{FeeCalculator, PricingBreakdown, PricingCalculator, PricingInput};
use ticketbooth_core::promo::{AppliedPromo, PromoCode};
use ticketbooth_core::validation::{validate_non_negative, Validate, ValidationContext};
use ticketbooth_core::{FieldErrors, LineItem, Money};

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};
use crate::gateway::{CheckoutUrl, PaymentGateway, PaymentRequest};

// =============================================================================
// Phase
// =============================================================================

/// Where a checkout submission stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    /// Editable, nothing in flight.
    #[default]
    Idle,
    /// Rules are running.
    Validating,
    /// Waiting on the payment gateway.
    Submitting,
    /// A checkout URL was issued.
    Success,
    /// The gateway call failed; waiting for `retry`.
    Failed,
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutPhase::Idle => write!(f, "idle"),
            CheckoutPhase::Validating => write!(f, "validating"),
            CheckoutPhase::Submitting => write!(f, "submitting"),
            CheckoutPhase::Success => write!(f, "success"),
            CheckoutPhase::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// Listener
// =============================================================================

/// Receives the outcome of each submission (implemented by the UI layer).
pub trait CheckoutListener: Send + Sync {
    /// The buyer should be sent to `url`.
    fn on_success(&self, url: &CheckoutUrl);

    /// The submission failed. Gateway errors arrive unchanged inside
    /// [`CheckoutError::Payment`].
    fn on_error(&self, error: &CheckoutError);
}

/// Listener that ignores everything.
pub struct NoOpListener;

impl CheckoutListener for NoOpListener {
    fn on_success(&self, _url: &CheckoutUrl) {}
    fn on_error(&self, _error: &CheckoutError) {}
}

// =============================================================================
// Session
// =============================================================================

/// One checkout, from modal open to payment URL.
pub struct CheckoutSession {
    id: Uuid,
    request: CheckoutRequest,
    tip: Money,
    promo: AppliedPromo,
    is_platform_fee: bool,
    calculator: PricingCalculator,
    currency: String,
    user_id: Option<String>,
    breakdown: PricingBreakdown,
    phase: CheckoutPhase,
    last_error: Option<String>,
    gateway: Arc<dyn PaymentGateway>,
    fees: Arc<dyn FeeCalculator + Send + Sync>,
    listener: Arc<dyn CheckoutListener>,
}

impl CheckoutSession {
    /// Opens a session at the default 8% tax rate, charging in USD.
    ///
    /// A cart form's own tip, platform-fee flag and promo code are picked up.
    /// An unrecognised promo code is left on the form for validation to
    /// report.
    pub fn new(
        request: CheckoutRequest,
        gateway: Arc<dyn PaymentGateway>,
        fees: Arc<dyn FeeCalculator + Send + Sync>,
    ) -> Self {
        let mut tip = Money::zero();
        let mut is_platform_fee = false;
        let mut promo = AppliedPromo::none();
        if let CheckoutRequest::Cart(form) = &request {
            tip = form.tip;
            is_platform_fee = form.is_platform_fee;
            if let Some(code) = form.promo_code.as_deref() {
                promo.apply(code).ok();
            }
        }

        let mut session = CheckoutSession {
            id: Uuid::new_v4(),
            request,
            tip,
            promo,
            is_platform_fee,
            calculator: PricingCalculator::default(),
            currency: "USD".to_string(),
            user_id: None,
            breakdown: PricingBreakdown::default(),
            phase: CheckoutPhase::Idle,
            last_error: None,
            gateway,
            fees,
            listener: Arc::new(NoOpListener),
        };
        session.refresh();
        debug!(session_id = %session.id, kind = session.request.kind_name(), "Checkout session opened");
        session
    }

    /// Opens a session using the tax rate, currency and platform-fee mode
    /// from `config`.
    pub fn from_config(
        request: CheckoutRequest,
        config: &CheckoutConfig,
        gateway: Arc<dyn PaymentGateway>,
        fees: Arc<dyn FeeCalculator + Send + Sync>,
    ) -> Self {
        let is_cart = matches!(request, CheckoutRequest::Cart(_));
        let mut session = Self::new(request, gateway, fees)
            .with_calculator(config.pricing_calculator())
            .with_currency(config.pricing.currency.clone());
        if !is_cart {
            session.is_platform_fee = config.pricing.platform_fee_mode;
            session.refresh();
        }
        session
    }

    pub fn with_listener(mut self, listener: Arc<dyn CheckoutListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_calculator(mut self, calculator: PricingCalculator) -> Self {
        self.calculator = calculator;
        self.refresh();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &CheckoutRequest {
        &self.request
    }

    pub fn breakdown(&self) -> PricingBreakdown {
        self.breakdown
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// True while a submission is validating or waiting on the gateway.
    pub fn is_processing(&self) -> bool {
        matches!(self.phase, CheckoutPhase::Validating | CheckoutPhase::Submitting)
    }

    pub fn promo_code(&self) -> Option<PromoCode> {
        self.promo.code()
    }

    /// The tip as entered. A negative tip prices as zero and blocks `submit`.
    pub fn tip(&self) -> Money {
        self.tip
    }

    pub fn is_platform_fee(&self) -> bool {
        self.is_platform_fee
    }

    /// Message of the last gateway failure, cleared by `retry`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // =========================================================================
    // Edits
    // =========================================================================

    pub fn set_tip(&mut self, tip: Money) -> CheckoutResult<()> {
        self.ensure_editable()?;
        validate_non_negative("tip", tip).map_err(FieldErrors::from)?;
        self.tip = tip;
        self.refresh();
        Ok(())
    }

    /// Applies a promo code. Applying the same code again changes nothing;
    /// a different valid code replaces the current one.
    pub fn apply_promo_code(&mut self, input: &str) -> CheckoutResult<PromoCode> {
        self.ensure_editable()?;
        let code = self.promo.apply(input)?;
        debug!(session_id = %self.id, code = %code, "Promo code applied");
        self.refresh();
        Ok(code)
    }

    pub fn clear_promo_code(&mut self) -> CheckoutResult<()> {
        self.ensure_editable()?;
        self.promo.clear();
        if let CheckoutRequest::Cart(form) = &mut self.request {
            form.promo_code = None;
        }
        self.refresh();
        Ok(())
    }

    pub fn set_is_platform_fee(&mut self, is_platform_fee: bool) -> CheckoutResult<()> {
        self.ensure_editable()?;
        self.is_platform_fee = is_platform_fee;
        self.refresh();
        Ok(())
    }

    /// Replaces the cart's lines. Duplicate ids are merged.
    pub fn set_items(&mut self, items: Vec<LineItem>) -> CheckoutResult<()> {
        self.edit_cart("set_items", |cart| {
            *cart = Cart::from_items(items)?;
            Ok(())
        })
    }

    pub fn add_item(&mut self, item: LineItem) -> CheckoutResult<()> {
        self.edit_cart("add_item", |cart| cart.add_item(item))
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> CheckoutResult<()> {
        self.edit_cart("update_quantity", |cart| cart.update_quantity(id, quantity))
    }

    pub fn remove_item(&mut self, id: &str) -> CheckoutResult<()> {
        self.edit_cart("remove_item", |cart| cart.remove_item(id))
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validates the form and, if it passes, asks the gateway for a checkout
    /// URL.
    ///
    /// An invalid form returns [`CheckoutError::Validation`] without touching
    /// the gateway and leaves the session `Idle`. A gateway failure returns
    /// [`CheckoutError::Payment`] and leaves it `Failed`.
    pub async fn submit(&mut self, ctx: &ValidationContext) -> CheckoutResult<CheckoutUrl> {
        match self.phase {
            CheckoutPhase::Validating | CheckoutPhase::Submitting => {
                return Err(CheckoutError::AlreadyProcessing)
            }
            CheckoutPhase::Success => return Err(CheckoutError::AlreadyCompleted),
            CheckoutPhase::Failed => return Err(CheckoutError::RetryRequired),
            CheckoutPhase::Idle => {}
        }

        self.refresh();
        self.transition(CheckoutPhase::Validating);

        if let Err(errors) = self.validate_request(ctx) {
            debug!(session_id = %self.id, errors = errors.len(), "Checkout form invalid");
            self.transition(CheckoutPhase::Idle);
            let err = CheckoutError::Validation(errors);
            self.listener.on_error(&err);
            return Err(err);
        }

        let payment = self.payment_request();
        self.transition(CheckoutPhase::Submitting);
        info!(
            session_id = %self.id,
            amount = %payment.amount,
            payment_type = %payment.payment_type,
            "Submitting checkout"
        );

        match self.gateway.create_checkout(payment).await {
            Ok(url) => {
                self.transition(CheckoutPhase::Success);
                info!(session_id = %self.id, "Checkout created");
                self.listener.on_success(&url);
                Ok(url)
            }
            Err(error) => {
                warn!(session_id = %self.id, %error, "Payment gateway failed");
                self.last_error = Some(error.to_string());
                self.transition(CheckoutPhase::Failed);
                let err = CheckoutError::Payment(error);
                self.listener.on_error(&err);
                Err(err)
            }
        }
    }

    /// Returns a failed session to `Idle` so it can be submitted again.
    pub fn retry(&mut self) -> CheckoutResult<()> {
        if self.phase != CheckoutPhase::Failed {
            return Err(CheckoutError::NothingToRetry(self.phase));
        }
        self.last_error = None;
        self.transition(CheckoutPhase::Idle);
        Ok(())
    }

    /// Discards the session.
    pub fn cancel(self) {
        debug!(session_id = %self.id, phase = %self.phase, "Checkout session cancelled");
    }

    /// The payment request the current state would submit.
    pub fn payment_request(&self) -> PaymentRequest {
        let b = &self.breakdown;
        let mut metadata = BTreeMap::new();
        metadata.insert("sessionId".to_string(), self.id.to_string());
        metadata.insert("checkoutKind".to_string(), self.request.kind_name().to_string());
        metadata.insert("subtotal".to_string(), b.subtotal.cents().to_string());
        metadata.insert("tax".to_string(), b.tax.cents().to_string());
        metadata.insert("platformFee".to_string(), b.platform_fee.cents().to_string());
        metadata.insert("tip".to_string(), b.tip.cents().to_string());
        metadata.insert("discount".to_string(), b.discount.cents().to_string());
        metadata.insert("isPlatformFee".to_string(), self.is_platform_fee.to_string());
        if let Some(code) = self.promo.code() {
            metadata.insert("promoCode".to_string(), code.to_string());
        }
        if let CheckoutRequest::Pledge(form) = &self.request {
            metadata.insert("ticketQuantity".to_string(), form.ticket_quantity.to_string());
        }

        PaymentRequest {
            amount: b.total,
            currency: self.currency.clone(),
            payment_type: self.request.payment_type(),
            description: self.request.description(),
            product_id: self.request.product_id().map(str::to_string),
            customer_email: self.request.customer_email().map(str::to_string),
            user_id: self.user_id.clone(),
            metadata,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Form rules plus the tip as entered. Pricing treats a negative tip as
    /// zero and mirrors that into a cart form, so the form alone cannot see it.
    fn validate_request(&self, ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut errors = match self.request.validate(ctx) {
            Ok(()) => FieldErrors::new(),
            Err(errors) => errors,
        };
        if let Err(err) = validate_non_negative("tip", self.tip) {
            errors.push(err);
        }
        errors.into_result()
    }

    fn ensure_editable(&self) -> CheckoutResult<()> {
        match self.phase {
            CheckoutPhase::Validating | CheckoutPhase::Submitting => {
                Err(CheckoutError::AlreadyProcessing)
            }
            CheckoutPhase::Success => Err(CheckoutError::AlreadyCompleted),
            CheckoutPhase::Idle | CheckoutPhase::Failed => Ok(()),
        }
    }

    fn edit_cart<R>(
        &mut self,
        operation: &'static str,
        edit: impl FnOnce(&mut Cart) -> ticketbooth_core::CoreResult<R>,
    ) -> CheckoutResult<()> {
        self.ensure_editable()?;
        let kind = self.request.kind_name();
        let CheckoutRequest::Cart(form) = &mut self.request else {
            return Err(CheckoutError::Unsupported { operation, kind });
        };

        let mut cart = Cart {
            items: std::mem::take(&mut form.items),
        };
        let result = edit(&mut cart);
        form.items = cart.items;
        result?;

        self.refresh();
        Ok(())
    }

    /// Recomputes the breakdown and mirrors it into a cart form.
    fn refresh(&mut self) {
        let items = self.request.line_items();
        let subtotal = ticketbooth_core::pricing::subtotal_of(&items);
        let input = PricingInput::new(subtotal)
            .with_tip(self.tip)
            .with_discount(self.promo.discount_for(subtotal))
            .with_platform_fee(self.is_platform_fee);
        self.breakdown = self.calculator.price(&input, &*self.fees);

        if let CheckoutRequest::Cart(form) = &mut self.request {
            form.set_breakdown(&self.breakdown);
            form.is_platform_fee = self.is_platform_fee;
            if let Some(code) = self.promo.code() {
                form.promo_code = Some(code.to_string());
            }
        }
    }

    fn transition(&mut self, next: CheckoutPhase) {
        debug!(session_id = %self.id, from = %self.phase, to = %next, "Checkout phase change");
        self.phase = next;
    }
}

impl fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("id", &self.id)
            .field("kind", &self.request.kind_name())
            .field("phase", &self.phase)
            .field("breakdown", &self.breakdown)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use ticketbooth_core::forms::{CheckoutForm, ContactDetails, PledgeForm};
    use ticketbooth_core::pricing::CardRateFeeCalculator;
    use ticketbooth_core::{CoreError, ItemKind, PaymentType};

    use crate::error::GatewayError;
    use crate::gateway::MockPaymentGateway;

    #[derive(Default)]
    struct RecordingListener {
        successes: Mutex<Vec<CheckoutUrl>>,
        errors: Mutex<Vec<String>>,
    }

    impl CheckoutListener for RecordingListener {
        fn on_success(&self, url: &CheckoutUrl) {
            self.successes.lock().push(url.clone());
        }

        fn on_error(&self, error: &CheckoutError) {
            self.errors.lock().push(error.to_string());
        }
    }

    fn ctx() -> ValidationContext {
        ValidationContext::at(Utc::now())
    }

    fn cart_form(subtotal_cents: i64) -> CheckoutForm {
        CheckoutForm {
            items: vec![LineItem::new(
                "ga",
                "General Admission",
                Money::from_cents(subtotal_cents),
                1,
                ItemKind::Ticket,
            )],
            contact: ContactDetails {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            },
            accept_terms: true,
            accept_refund_policy: true,
            ..CheckoutForm::default()
        }
    }

    fn session_with(form: CheckoutForm) -> (CheckoutSession, Arc<MockPaymentGateway>, Arc<RecordingListener>) {
        let gateway = Arc::new(MockPaymentGateway::new());
        let listener = Arc::new(RecordingListener::default());
        let session = CheckoutSession::new(
            CheckoutRequest::Cart(form),
            gateway.clone(),
            Arc::new(CardRateFeeCalculator::default()),
        )
        .with_listener(listener.clone());
        (session, gateway, listener)
    }

    #[test]
    fn test_hundred_dollar_cart_prices_on_open() {
        let (mut session, _, _) = session_with(cart_form(10_000));
        let b = session.breakdown();
        assert_eq!(b.tax.cents(), 800);
        assert_eq!(b.platform_fee.cents(), 320);
        assert_eq!(b.total.cents(), 11_120);

        session.set_tip(Money::from_cents(1_000)).unwrap();
        assert_eq!(session.breakdown().total.cents(), 12_120);
    }

    #[test]
    fn test_platform_fee_mode_drops_processing_fee() {
        let (mut session, _, _) = session_with(cart_form(10_000));
        session.set_is_platform_fee(true).unwrap();
        let b = session.breakdown();
        assert_eq!(b.platform_fee, Money::zero());
        assert_eq!(b.total.cents(), 10_800);
    }

    #[test]
    fn test_save10_does_not_compound() {
        let (mut session, _, _) = session_with(cart_form(10_000));
        assert_eq!(session.apply_promo_code("SAVE10").unwrap(), PromoCode::Save10);
        let once = session.breakdown();
        assert_eq!(once.discount.cents(), 1_000);

        session.apply_promo_code(" SAVE10 ").unwrap();
        assert_eq!(session.breakdown(), once);
        assert!(once.is_consistent());
    }

    #[test]
    fn test_invalid_promo_leaves_pricing_alone() {
        let (mut session, _, _) = session_with(cart_form(10_000));
        session.apply_promo_code("SAVE10").unwrap();
        let before = session.breakdown();

        let err = session.apply_promo_code("save10").unwrap_err();
        assert!(matches!(err, CheckoutError::Core(_)));
        assert_eq!(session.breakdown(), before);
        assert_eq!(session.promo_code(), Some(PromoCode::Save10));

        session.clear_promo_code().unwrap();
        assert_eq!(session.breakdown().discount, Money::zero());
    }

    #[test]
    fn test_negative_tip_rejected() {
        let (mut session, _, _) = session_with(cart_form(10_000));
        let err = session.set_tip(Money::from_cents(-100)).unwrap_err();
        assert!(err.field_errors().is_some_and(|e| e.contains_field("tip")));
        assert_eq!(session.tip(), Money::zero());
    }

    #[test]
    fn test_item_edits_reprice() {
        let (mut session, _, _) = session_with(cart_form(10_000));
        session
            .add_item(LineItem::new("tee", "Tee", Money::from_cents(2_500), 2, ItemKind::Product))
            .unwrap();
        assert_eq!(session.breakdown().subtotal.cents(), 15_000);

        session.update_quantity("tee", 1).unwrap();
        assert_eq!(session.breakdown().subtotal.cents(), 12_500);

        session.remove_item("ga").unwrap();
        assert_eq!(session.breakdown().subtotal.cents(), 2_500);

        assert!(matches!(
            session.remove_item("ga"),
            Err(CheckoutError::Core(_))
        ));

        session
            .set_items(vec![
                LineItem::new("ga", "GA", Money::from_cents(1_000), 1, ItemKind::Ticket),
                LineItem::new("ga", "GA", Money::from_cents(1_000), 2, ItemKind::Ticket),
            ])
            .unwrap();
        assert_eq!(session.breakdown().subtotal.cents(), 3_000);
        match session.request() {
            CheckoutRequest::Cart(form) => {
                assert_eq!(form.items.len(), 1);
                assert_eq!(form.total, session.breakdown().total);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_cart_edits_keep_quantities_positive() {
        let (mut session, _, _) = session_with(cart_form(1_000));
        let before = session.breakdown();

        assert!(matches!(
            session.update_quantity("ga", -3),
            Err(CheckoutError::Core(CoreError::InvalidQuantity { requested: -3 }))
        ));
        assert!(session
            .add_item(LineItem::new("vip", "VIP", Money::from_cents(5_000), -4, ItemKind::Ticket))
            .is_err());
        assert!(session
            .add_item(LineItem::new(
                "gold",
                "Gold",
                Money::from_cents(9_000_000_000_000_000_000),
                2,
                ItemKind::Ticket
            ))
            .is_err());

        assert_eq!(session.breakdown(), before);
        match session.request() {
            CheckoutRequest::Cart(form) => assert_eq!(form.items.len(), 1),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submitted_negative_tip_never_reaches_gateway() {
        let mut form = cart_form(10_000);
        form.tip = Money::from_cents(-500);
        let (mut session, gateway, listener) = session_with(form);
        assert_eq!(session.tip().cents(), -500);
        assert_eq!(session.breakdown().tip, Money::zero());

        let err = session.submit(&ctx()).await.unwrap_err();

        assert!(err.field_errors().is_some_and(|e| e.contains_field("tip")));
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(session.phase(), CheckoutPhase::Idle);
        assert_eq!(listener.errors.lock().len(), 1);

        session.set_tip(Money::zero()).unwrap();
        assert!(session.submit(&ctx()).await.is_ok());
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unaccepted_terms_never_reach_gateway() {
        let mut form = cart_form(10_000);
        form.accept_terms = false;
        let (mut session, gateway, listener) = session_with(form);

        let err = session.submit(&ctx()).await.unwrap_err();

        assert!(err.field_errors().is_some_and(|e| e.contains_field("acceptTerms")));
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(session.phase(), CheckoutPhase::Idle);
        assert!(!session.is_processing());
        assert_eq!(listener.errors.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_submit() {
        let (mut session, gateway, listener) = session_with(cart_form(10_000));
        session.set_tip(Money::from_cents(1_000)).unwrap();

        let url = session.submit(&ctx()).await.unwrap();

        assert_eq!(session.phase(), CheckoutPhase::Success);
        assert_eq!(listener.successes.lock().as_slice(), &[url]);

        let sent = gateway.last_request().unwrap();
        assert_eq!(sent.amount.cents(), 12_120);
        assert_eq!(sent.currency, "USD");
        assert_eq!(sent.payment_type, PaymentType::Ticket);
        assert_eq!(sent.customer_email.as_deref(), Some("ada@example.com"));
        assert_eq!(sent.metadata["checkoutKind"], "cart");
        assert_eq!(sent.metadata["tip"], "1000");

        assert!(matches!(
            session.submit(&ctx()).await,
            Err(CheckoutError::AlreadyCompleted)
        ));
        assert!(matches!(
            session.set_tip(Money::zero()),
            Err(CheckoutError::AlreadyCompleted)
        ));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_failure_then_retry() {
        let (mut session, gateway, listener) = session_with(cart_form(10_000));
        gateway.fail_next(GatewayError::Declined("card_declined".into()));

        let err = session.submit(&ctx()).await.unwrap_err();
        assert!(matches!(
            &err,
            CheckoutError::Payment(GatewayError::Declined(reason)) if reason == "card_declined"
        ));
        assert_eq!(session.phase(), CheckoutPhase::Failed);
        assert_eq!(session.last_error(), Some("Payment declined: card_declined"));
        assert_eq!(
            listener.errors.lock().as_slice(),
            &["Payment declined: card_declined".to_string()]
        );

        // No automatic retry.
        assert!(matches!(
            session.submit(&ctx()).await,
            Err(CheckoutError::RetryRequired)
        ));
        assert_eq!(gateway.call_count(), 1);

        session.retry().unwrap();
        assert_eq!(session.phase(), CheckoutPhase::Idle);
        assert!(session.last_error().is_none());

        session.submit(&ctx()).await.unwrap();
        assert_eq!(session.phase(), CheckoutPhase::Success);
        assert_eq!(gateway.call_count(), 2);
    }

    #[test]
    fn test_retry_only_from_failed() {
        let (mut session, _, _) = session_with(cart_form(10_000));
        assert!(matches!(
            session.retry(),
            Err(CheckoutError::NothingToRetry(CheckoutPhase::Idle))
        ));
        session.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pledge_checkout() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let pledge = PledgeForm {
            event_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            pledge_amount: Money::from_cents(5_000),
            ticket_quantity: 2,
            max_pledge_amount: Some(Money::from_cents(4_000)),
            allow_overpledge: false,
            email: Some("backer@example.com".to_string()),
            understand_pledge_terms: true,
            accept_cancellation_policy: true,
        };
        let mut session = CheckoutSession::new(
            CheckoutRequest::Pledge(pledge),
            gateway.clone(),
            Arc::new(CardRateFeeCalculator::default()),
        );

        assert!(matches!(
            session.add_item(LineItem::new("x", "X", Money::zero(), 1, ItemKind::Product)),
            Err(CheckoutError::Unsupported { kind: "pledge", .. })
        ));

        let err = session.submit(&ctx()).await.unwrap_err();
        assert!(err
            .field_errors()
            .is_some_and(|e| e.contains_field("pledgeAmount")));
        assert_eq!(gateway.call_count(), 0);
    }

    #[test]
    fn test_from_config_applies_platform_fee_mode() {
        let mut config = CheckoutConfig::default();
        config.pricing.platform_fee_mode = true;
        config.pricing.currency = "EUR".to_string();

        let quick = ticketbooth_core::forms::QuickCheckoutForm {
            product_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            product_name: "Poster".to_string(),
            unit_price: Money::from_cents(10_000),
            quantity: 1,
            kind: ItemKind::Product,
            email: "fan@example.com".to_string(),
            accept_terms: true,
        };
        let session = CheckoutSession::from_config(
            CheckoutRequest::Quick(quick),
            &config,
            Arc::new(MockPaymentGateway::new()),
            Arc::new(CardRateFeeCalculator::default()),
        );

        assert!(session.is_platform_fee());
        assert_eq!(session.breakdown().total.cents(), 10_800);
        assert_eq!(session.payment_request().currency, "EUR");
    }
}
