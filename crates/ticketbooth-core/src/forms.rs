//! # Form Payloads
//!
//! Strongly-typed payloads for every form that reaches checkout or
//! submission. The frontend binds to the generated TypeScript types; field
//! names serialize as camelCase and validation paths use the same names.
//!
//! ## Checkout Variants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutRequest (resolved once, when the modal opens)                 │
//! │                                                                         │
//! │  Cart ─────────► CheckoutForm        many line items, tip, promo       │
//! │  Quick ────────► QuickCheckoutForm   one product, one quantity         │
//! │  Pledge ───────► PledgeForm          all-or-nothing campaign pledge    │
//! │  Subscription ─► SubscriptionForm    creator tier                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Event, credit card and transfer forms are validated on their own and never
//! go through the checkout session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::PricingBreakdown;
use crate::types::{ItemKind, LineItem, PaymentType};

// =============================================================================
// Shared
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

// =============================================================================
// Checkout
// =============================================================================

/// Full cart checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub platform_fee: Money,
    #[serde(default)]
    pub tip: Money,
    #[serde(default)]
    pub discount: Money,
    pub total: Money,
    #[serde(default)]
    pub is_platform_fee: bool,
    #[serde(default)]
    pub promo_code: Option<String>,
    pub contact: ContactDetails,
    pub accept_terms: bool,
    pub accept_refund_policy: bool,
}

impl CheckoutForm {
    /// The amounts as submitted by the form.
    pub fn submitted_breakdown(&self) -> PricingBreakdown {
        PricingBreakdown {
            subtotal: self.subtotal,
            tax: self.tax,
            platform_fee: self.platform_fee,
            tip: self.tip,
            discount: self.discount,
            total: self.total,
        }
    }

    /// Writes a freshly computed breakdown back into the form fields.
    pub fn set_breakdown(&mut self, breakdown: &PricingBreakdown) {
        self.subtotal = breakdown.subtotal;
        self.tax = breakdown.tax;
        self.platform_fee = breakdown.platform_fee;
        self.tip = breakdown.tip;
        self.discount = breakdown.discount;
        self.total = breakdown.total;
    }
}

/// Single-product "buy now" checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuickCheckoutForm {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub email: String,
    pub accept_terms: bool,
}

// =============================================================================
// Pledge
// =============================================================================

/// Pledge to an all-or-nothing campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PledgeForm {
    pub event_id: String,
    pub pledge_amount: Money,
    pub ticket_quantity: i64,
    #[serde(default)]
    pub max_pledge_amount: Option<Money>,
    #[serde(default)]
    pub allow_overpledge: bool,
    #[serde(default)]
    pub email: Option<String>,
    pub understand_pledge_terms: bool,
    pub accept_cancellation_policy: bool,
}

// =============================================================================
// Subscription
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

/// Creator subscription signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionForm {
    pub tier_id: String,
    pub tier_name: String,
    pub price: Money,
    pub billing_interval: BillingInterval,
    pub email: String,
    pub accept_terms: bool,
}

// =============================================================================
// Checkout Request
// =============================================================================

/// The form behind a checkout session.
///
/// The variant is fixed when the session is created; nothing downstream
/// inspects fields by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutRequest {
    Cart(CheckoutForm),
    Quick(QuickCheckoutForm),
    Pledge(PledgeForm),
    Subscription(SubscriptionForm),
}

impl CheckoutRequest {
    /// The lines this request is priced from.
    pub fn line_items(&self) -> Vec<LineItem> {
        match self {
            CheckoutRequest::Cart(form) => form.items.clone(),
            CheckoutRequest::Quick(form) => vec![LineItem::new(
                form.product_id.clone(),
                form.product_name.clone(),
                form.unit_price,
                form.quantity,
                form.kind,
            )],
            CheckoutRequest::Pledge(form) => vec![LineItem::new(
                form.event_id.clone(),
                "Pledge",
                form.pledge_amount,
                1,
                ItemKind::Ticket,
            )],
            CheckoutRequest::Subscription(form) => vec![LineItem::new(
                form.tier_id.clone(),
                form.tier_name.clone(),
                form.price,
                1,
                ItemKind::Subscription,
            )],
        }
    }

    pub fn payment_type(&self) -> PaymentType {
        match self {
            CheckoutRequest::Cart(form) => form
                .items
                .first()
                .map(|i| PaymentType::from(i.kind))
                .unwrap_or(PaymentType::Ticket),
            CheckoutRequest::Quick(form) => PaymentType::from(form.kind),
            CheckoutRequest::Pledge(_) => PaymentType::Pledge,
            CheckoutRequest::Subscription(_) => PaymentType::Subscription,
        }
    }

    /// Human-readable description sent with the payment.
    pub fn description(&self) -> String {
        match self {
            CheckoutRequest::Cart(form) => match form.items.as_slice() {
                [] => "Empty checkout".to_string(),
                [only] => format!("{} x{}", only.name, only.quantity),
                [first, rest @ ..] => format!("{} and {} more", first.name, rest.len()),
            },
            CheckoutRequest::Quick(form) => format!("{} x{}", form.product_name, form.quantity),
            CheckoutRequest::Pledge(form) => format!(
                "Pledge for {} ticket(s) to event {}",
                form.ticket_quantity, form.event_id
            ),
            CheckoutRequest::Subscription(form) => {
                let interval = match form.billing_interval {
                    BillingInterval::Monthly => "monthly",
                    BillingInterval::Yearly => "yearly",
                };
                format!("{} ({})", form.tier_name, interval)
            }
        }
    }

    pub fn customer_email(&self) -> Option<&str> {
        match self {
            CheckoutRequest::Cart(form) => Some(form.contact.email.as_str()),
            CheckoutRequest::Quick(form) => Some(form.email.as_str()),
            CheckoutRequest::Pledge(form) => form.email.as_deref(),
            CheckoutRequest::Subscription(form) => Some(form.email.as_str()),
        }
        .filter(|e| !e.trim().is_empty())
    }

    /// Product, event or tier the payment is for, when there is exactly one.
    pub fn product_id(&self) -> Option<&str> {
        match self {
            CheckoutRequest::Cart(form) => match form.items.as_slice() {
                [only] => Some(only.id.as_str()),
                _ => None,
            },
            CheckoutRequest::Quick(form) => Some(form.product_id.as_str()),
            CheckoutRequest::Pledge(form) => Some(form.event_id.as_str()),
            CheckoutRequest::Subscription(form) => Some(form.tier_id.as_str()),
        }
    }

    /// Short name of the variant, used in logs and payment metadata.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CheckoutRequest::Cart(_) => "cart",
            CheckoutRequest::Quick(_) => "quick",
            CheckoutRequest::Pledge(_) => "pledge",
            CheckoutRequest::Subscription(_) => "subscription",
        }
    }
}

// =============================================================================
// Event
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EventFormat {
    InPerson,
    Virtual,
    Hybrid,
}

impl EventFormat {
    /// Virtual and hybrid events need joining details.
    pub fn needs_virtual_details(&self) -> bool {
        matches!(self, EventFormat::Virtual | EventFormat::Hybrid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Single,
    Recurring,
    Tour,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VirtualEventDetails {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TourDate {
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub venue: String,
    pub city: String,
}

/// All-or-nothing campaign settings. Present only on campaign events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSettings {
    pub funding_goal: Money,
    #[ts(as = "String")]
    pub deadline_date: DateTime<Utc>,
    #[serde(default)]
    pub max_pledge_amount: Option<Money>,
    #[serde(default)]
    pub allow_overpledge: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSettings {
    pub enabled: bool,
    pub commission_percent: u8,
}

/// Event creation / edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EventForm {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    pub format: EventFormat,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub virtual_event_details: Option<VirtualEventDetails>,
    #[serde(default)]
    pub tour_dates: Vec<TourDate>,
    #[serde(default)]
    pub campaign_settings: Option<CampaignSettings>,
    #[serde(default)]
    pub referral_settings: Option<ReferralSettings>,
}

// =============================================================================
// Credit Card
// =============================================================================

/// Raw card entry, as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardForm {
    pub cardholder_name: String,
    pub card_number: String,
    /// Two digits, `01`-`12`.
    pub expiry_month: String,
    /// Two or four digits.
    pub expiry_year: String,
    pub cvv: String,
}

// =============================================================================
// Transfer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Immediate,
    Scheduled,
}

/// Moves a balance to another user, split between platform credit and funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransferForm {
    pub recipient_id: String,
    pub amount: Money,
    pub credit_amount: Money,
    pub funds_amount: Money,
    #[serde(rename = "type")]
    pub kind: TransferKind,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}
