//! # Promo Codes
//!
//! Client-side promo discounts. Codes are not persisted and are not
//! re-validated server-side; the only recognised code is `SAVE10`.
//!
//! A checkout holds at most one applied code. Entering a code again replaces
//! the applied one, so discounts never compound.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// A recognised promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PromoCode {
    /// 10% off the subtotal.
    #[serde(rename = "SAVE10")]
    Save10,
}

impl PromoCode {
    /// Parses user input. Surrounding whitespace is ignored; matching is case-sensitive.
    ///
    /// ```rust
    /// use ticketbooth_core::promo::PromoCode;
    ///
    /// assert_eq!(PromoCode::parse(" SAVE10 "), Some(PromoCode::Save10));
    /// assert_eq!(PromoCode::parse("save10"), None);
    /// ```
    pub fn parse(input: &str) -> Option<PromoCode> {
        match input.trim() {
            "SAVE10" => Some(PromoCode::Save10),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromoCode::Save10 => "SAVE10",
        }
    }

    /// Discount in basis points of the subtotal.
    pub fn discount_bps(&self) -> u32 {
        match self {
            PromoCode::Save10 => 1000,
        }
    }

    /// Discount this code grants on `subtotal`.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        subtotal.max(Money::zero()).percentage_bps(self.discount_bps())
    }
}

impl std::fmt::Display for PromoCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The promo slot of a checkout form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPromo {
    code: Option<PromoCode>,
}

impl AppliedPromo {
    pub fn none() -> Self {
        AppliedPromo::default()
    }

    /// Applies `input`, replacing any code already applied.
    ///
    /// An unrecognised code leaves the current state untouched.
    pub fn apply(&mut self, input: &str) -> CoreResult<PromoCode> {
        let code = PromoCode::parse(input)
            .ok_or_else(|| CoreError::InvalidPromoCode(input.trim().to_string()))?;
        self.code = Some(code);
        Ok(code)
    }

    pub fn clear(&mut self) {
        self.code = None;
    }

    pub fn code(&self) -> Option<PromoCode> {
        self.code
    }

    /// Discount on `subtotal`; zero when no code is applied.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        self.code
            .map(|c| c.discount_for(subtotal))
            .unwrap_or_default()
    }
}
