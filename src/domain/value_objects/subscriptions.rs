use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    enums::subscription_statuses::SubscriptionStatus,
    plans::{PlanDto, PlanFeatures},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePlanRequest {
    pub target_slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetainServicesRequest {
    pub retain_ids: Vec<i64>,
    pub max_allowed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSubscriptionRequest {
    pub reason_code: String,
    pub reason_text: Option<String>,
}

/// Read-model projection of a professional's subscription and its plan.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionSnapshot {
    pub has_subscription: bool,
    pub plan: PlanDto,
    pub status: Option<SubscriptionStatus>,
    pub amount_minor: i32,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub trial_days_remaining: Option<i64>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason_code: Option<String>,
    pub cancellation_reason: Option<String>,
    pub checkout_url: Option<String>,
}

/// Feature gates of the effective plan, as consumed by UI gating.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanFeatureSnapshot {
    pub has_subscription: bool,
    pub plan_slug: String,
    pub plan_name: String,
    pub max_services: Option<usize>,
    pub features: PlanFeatures,
    pub trial_expired: bool,
    pub trial_days_remaining: Option<i64>,
    pub needs_upgrade: bool,
}
