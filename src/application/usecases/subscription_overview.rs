use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity,
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        plans::{PlanCatalog, PlanDto, TRIAL_PLAN_SLUG},
        subscriptions::{PlanFeatureSnapshot, SubscriptionSnapshot},
    },
};

pub struct SubscriptionOverviewUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    catalog: Arc<PlanCatalog>,
}

impl<S> SubscriptionOverviewUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, catalog: Arc<PlanCatalog>) -> Self {
        Self {
            subscription_repo,
            catalog,
        }
    }

    pub fn list_plans(&self) -> Vec<PlanDto> {
        self.catalog.all().iter().map(PlanDto::from).collect()
    }

    pub async fn snapshot(&self, professional_id: Uuid) -> Result<SubscriptionSnapshot> {
        let row = self.load(professional_id).await?;

        // Professionals without a row are presented on the trial tier so the
        // client renders a single shape either way.
        let trial = self.trial_plan();
        let Some(row) = row else {
            debug!(%professional_id, "subscription_overview: no subscription on record");
            return Ok(SubscriptionSnapshot {
                has_subscription: false,
                plan: PlanDto::from(trial),
                status: None,
                amount_minor: 0,
                trial_ends_at: None,
                trial_days_remaining: trial.trial_days,
                next_billing_date: None,
                last_payment_date: None,
                cancelled_at: None,
                cancellation_reason_code: None,
                cancellation_reason: None,
                checkout_url: None,
            });
        };

        let plan = self.catalog.get(&row.plan_slug).unwrap_or(trial);
        let status = SubscriptionStatus::from_str(&row.status);
        let checkout_url = match status {
            SubscriptionStatus::Pending => row.checkout_url.clone(),
            _ => None,
        };

        Ok(SubscriptionSnapshot {
            has_subscription: true,
            plan: PlanDto::from(plan),
            status: Some(status),
            amount_minor: row.amount_minor,
            trial_ends_at: row.trial_ends_at,
            trial_days_remaining: trial_days_remaining(row.trial_ends_at, Utc::now()),
            next_billing_date: row.next_billing_date,
            last_payment_date: row.last_payment_date,
            cancelled_at: row.cancelled_at,
            cancellation_reason_code: row.cancellation_reason_code.clone(),
            cancellation_reason: row.cancellation_reason.clone(),
            checkout_url,
        })
    }

    pub async fn plan_features(&self, professional_id: Uuid) -> Result<PlanFeatureSnapshot> {
        let row = self.load(professional_id).await?;
        let trial = self.trial_plan();
        let now = Utc::now();

        let (plan, has_subscription, trial_ends_at) = match &row {
            Some(row)
                if SubscriptionStatus::from_str(&row.status) != SubscriptionStatus::Cancelled =>
            {
                (
                    self.catalog.get(&row.plan_slug).unwrap_or(trial),
                    true,
                    row.trial_ends_at,
                )
            }
            _ => (trial, false, None),
        };

        let remaining = trial_days_remaining(trial_ends_at, now);
        let trial_expired = plan.slug == TRIAL_PLAN_SLUG
            && trial_ends_at.is_some_and(|ends_at| ends_at <= now);

        Ok(PlanFeatureSnapshot {
            has_subscription,
            plan_slug: plan.slug.to_string(),
            plan_name: plan.name.to_string(),
            max_services: plan.max_services,
            features: plan.features,
            trial_expired,
            trial_days_remaining: remaining,
            needs_upgrade: trial_expired,
        })
    }

    fn trial_plan(&self) -> &crate::domain::value_objects::plans::Plan {
        // The catalog always carries the trial tier.
        self.catalog
            .all()
            .iter()
            .find(|plan| plan.slug == TRIAL_PLAN_SLUG)
            .unwrap_or_else(|| &self.catalog.all()[0])
    }

    async fn load(&self, professional_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        self.subscription_repo
            .find_by_professional(professional_id)
            .await
            .map_err(|err| {
                error!(
                    %professional_id,
                    db_error = ?err,
                    "subscription_overview: failed to load subscription"
                );
                err
            })
    }
}

fn trial_days_remaining(trial_ends_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    trial_ends_at.map(|ends_at| (ends_at - now).num_days().max(0))
}
