//! Event creation rules, including all-or-nothing campaign settings.

use crate::error::{FieldErrors, ValidationError};
use crate::forms::{CampaignSettings, EventForm, EventKind, ReferralSettings, TourDate, VirtualEventDetails};
use crate::MAX_REFERRAL_COMMISSION_PERCENT;

use super::{
    validate_future, validate_http_url, validate_optional_text, validate_positive, validate_text,
    Rules, Validate, ValidationContext,
};

/// Tours need at least this many stops.
const MIN_TOUR_DATES: usize = 2;

impl Validate for VirtualEventDetails {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();
        rules.check(validate_text("platform", &self.platform, 1, 100));
        rules.check(validate_http_url("url", &self.url));
        rules.finish()
    }
}

impl Validate for TourDate {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();
        rules.check(validate_text("venue", &self.venue, 1, 200));
        rules.check(validate_text("city", &self.city, 1, 100));
        rules.finish()
    }
}

impl Validate for ReferralSettings {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();
        if self.enabled
            && !(1..=MAX_REFERRAL_COMMISSION_PERCENT).contains(&self.commission_percent)
        {
            rules.fail(ValidationError::OutOfRange {
                field: "commissionPercent".to_string(),
                min: 1,
                max: i64::from(MAX_REFERRAL_COMMISSION_PERCENT),
            });
        }
        rules.finish()
    }
}

/// Campaign rules that don't depend on the rest of the event.
impl Validate for CampaignSettings {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();
        rules.check(validate_positive("fundingGoal", self.funding_goal));
        rules.check(validate_future("deadlineDate", self.deadline_date, ctx.now));
        if let Some(max) = self.max_pledge_amount {
            rules.check(validate_positive("maxPledgeAmount", max));
        }
        rules.finish()
    }
}

/// ## Rules
/// - `title` 3..=100 characters, `description` at most 5000
/// - `endDate`, when set, after `startDate`
/// - virtual and hybrid events carry `virtualEventDetails`
/// - tours list at least two `tourDates` in ascending order
/// - `campaignSettings.deadlineDate` in the future and before `startDate`
/// - referral commission 1..=50% when referrals are on
impl Validate for EventForm {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), FieldErrors> {
        let mut rules = Rules::new();

        rules.check(validate_text("title", &self.title, 3, 100));
        rules.check(validate_optional_text("description", self.description.as_deref(), 5000));

        if let Some(end) = self.end_date {
            if end <= self.start_date {
                rules.fail(ValidationError::MustBeAfter {
                    field: "endDate".to_string(),
                    other: "startDate".to_string(),
                });
            }
        }

        if self.format.needs_virtual_details() {
            match &self.virtual_event_details {
                Some(details) => rules.nested("virtualEventDetails", details.validate(ctx)),
                None => rules.fail(ValidationError::Required {
                    field: "virtualEventDetails".to_string(),
                }),
            }
        }

        if self.kind == EventKind::Tour {
            if self.tour_dates.len() < MIN_TOUR_DATES {
                rules.fail(ValidationError::TooFew {
                    field: "tourDates".to_string(),
                    min: MIN_TOUR_DATES,
                });
            } else if self.tour_dates.windows(2).any(|w| w[1].date <= w[0].date) {
                rules.fail(ValidationError::NotChronological {
                    field: "tourDates".to_string(),
                });
            }
            for (i, stop) in self.tour_dates.iter().enumerate() {
                rules.nested(&format!("tourDates.{}", i), stop.validate(ctx));
            }
        }

        if let Some(campaign) = &self.campaign_settings {
            rules.nested("campaignSettings", campaign.validate(ctx));
            if campaign.deadline_date >= self.start_date {
                rules.fail(ValidationError::MustBeBefore {
                    field: "campaignSettings.deadlineDate".to_string(),
                    other: "startDate".to_string(),
                });
            }
        }

        if let Some(referral) = &self.referral_settings {
            rules.nested("referralSettings", referral.validate(ctx));
        }

        rules.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::EventFormat;
    use crate::money::Money;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn ctx() -> ValidationContext {
        ValidationContext::at(now())
    }

    fn event() -> EventForm {
        EventForm {
            title: "Spring Showcase".to_string(),
            description: None,
            start_date: now() + Duration::days(30),
            end_date: None,
            format: EventFormat::InPerson,
            kind: EventKind::Single,
            virtual_event_details: None,
            tour_dates: Vec::new(),
            campaign_settings: None,
            referral_settings: None,
        }
    }

    fn campaign(deadline: DateTime<Utc>) -> CampaignSettings {
        CampaignSettings {
            funding_goal: Money::from_cents(500_000),
            deadline_date: deadline,
            max_pledge_amount: None,
            allow_overpledge: false,
        }
    }

    #[test]
    fn test_plain_event_passes() {
        assert!(event().validate(&ctx()).is_ok());
    }

    #[test]
    fn test_campaign_deadline_before_start_passes() {
        let mut form = event();
        form.campaign_settings = Some(campaign(now() + Duration::days(10)));
        assert!(form.validate(&ctx()).is_ok());
    }

    #[test]
    fn test_campaign_deadline_in_past_rejected() {
        let mut form = event();
        form.campaign_settings = Some(campaign(now() - Duration::days(1)));

        let errors = form.validate(&ctx()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors.iter().next(),
            Some(ValidationError::MustBeInFuture { field }) if field == "campaignSettings.deadlineDate"
        ));
    }

    #[test]
    fn test_campaign_deadline_on_or_after_start_rejected() {
        let mut form = event();
        form.campaign_settings = Some(campaign(form.start_date));
        let errors = form.validate(&ctx()).unwrap_err();
        assert!(matches!(
            errors.iter().next(),
            Some(ValidationError::MustBeBefore { field, other })
                if field == "campaignSettings.deadlineDate" && other == "startDate"
        ));

        form.campaign_settings = Some(campaign(form.start_date + Duration::days(1)));
        assert!(form
            .validate(&ctx())
            .unwrap_err()
            .contains_field("campaignSettings.deadlineDate"));
    }

    #[test]
    fn test_campaign_goal_must_be_positive() {
        let mut form = event();
        let mut settings = campaign(now() + Duration::days(10));
        settings.funding_goal = Money::zero();
        form.campaign_settings = Some(settings);

        let errors = form.validate(&ctx()).unwrap_err();
        assert!(errors.contains_field("campaignSettings.fundingGoal"));
    }

    #[test]
    fn test_virtual_event_needs_details() {
        let mut form = event();
        form.format = EventFormat::Hybrid;
        assert!(form.validate(&ctx()).unwrap_err().contains_field("virtualEventDetails"));

        form.virtual_event_details = Some(VirtualEventDetails {
            platform: "Zoom".to_string(),
            url: "zoom.example.com/j/1".to_string(),
        });
        assert!(form
            .validate(&ctx())
            .unwrap_err()
            .contains_field("virtualEventDetails.url"));

        form.virtual_event_details = Some(VirtualEventDetails {
            platform: "Zoom".to_string(),
            url: "https://zoom.example.com/j/1".to_string(),
        });
        assert!(form.validate(&ctx()).is_ok());
    }

    #[test]
    fn test_tour_dates_count_and_order() {
        let stop = |days: i64, city: &str| TourDate {
            date: now() + Duration::days(days),
            venue: "Hall".to_string(),
            city: city.to_string(),
        };

        let mut form = event();
        form.kind = EventKind::Tour;
        form.tour_dates = vec![stop(30, "Leeds")];
        assert!(matches!(
            form.validate(&ctx()).unwrap_err().iter().next(),
            Some(ValidationError::TooFew { min: 2, .. })
        ));

        form.tour_dates = vec![stop(40, "Leeds"), stop(35, "York")];
        assert!(matches!(
            form.validate(&ctx()).unwrap_err().iter().next(),
            Some(ValidationError::NotChronological { .. })
        ));

        form.tour_dates = vec![stop(30, "Leeds"), stop(35, "")];
        assert!(form.validate(&ctx()).unwrap_err().contains_field("tourDates.1.city"));

        form.tour_dates = vec![stop(30, "Leeds"), stop(35, "York")];
        assert!(form.validate(&ctx()).is_ok());
    }

    #[test]
    fn test_title_and_end_date() {
        let mut form = event();
        form.title = "Hi".to_string();
        form.end_date = Some(form.start_date - Duration::hours(1));

        let errors = form.validate(&ctx()).unwrap_err();
        assert!(errors.contains_field("title"));
        assert!(errors.contains_field("endDate"));
    }

    #[test]
    fn test_referral_commission_range() {
        let mut form = event();
        form.referral_settings = Some(ReferralSettings {
            enabled: true,
            commission_percent: 51,
        });
        assert!(form
            .validate(&ctx())
            .unwrap_err()
            .contains_field("referralSettings.commissionPercent"));

        form.referral_settings = Some(ReferralSettings {
            enabled: false,
            commission_percent: 0,
        });
        assert!(form.validate(&ctx()).is_ok());

        form.referral_settings = Some(ReferralSettings {
            enabled: true,
            commission_percent: 50,
        });
        assert!(form.validate(&ctx()).is_ok());
    }
}
