use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::UpsertSubscriptionEntity,
    repositories::{services::ServiceRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        plans::{Plan, PlanCatalog, TRIAL_PLAN_SLUG},
        services::ServiceSummary,
    },
};

/// Billing window applied when the gateway confirms a recurring payment.
const BILLING_CYCLE_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct CheckoutHandle {
    /// Gateway-side id of the recurring plan, used to correlate webhooks.
    pub reference: String,
    pub checkout_url: String,
}

#[derive(Debug, Clone)]
pub struct PreapprovalDetails {
    pub status: String,
    /// Id of the recurring plan the preapproval was signed against. This is
    /// the reference stored when the checkout was created.
    pub preapproval_plan_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub status: String,
    pub preapproval_id: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_recurring_checkout(
        &self,
        professional_id: Uuid,
        plan: Plan,
    ) -> AnyResult<CheckoutHandle>;

    async fn fetch_preapproval(&self, preapproval_id: String) -> AnyResult<PreapprovalDetails>;

    async fn fetch_payment(&self, payment_id: String) -> AnyResult<PaymentDetails>;
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("unknown plan: {0}")]
    UnknownPlan(String),
    #[error("reverting from a paid plan to trial is not allowed")]
    TrialReversionForbidden,
    #[error("a plan change is already awaiting payment confirmation")]
    PaymentPending,
    #[error("payment checkout could not be initiated")]
    PaymentInitiationFailed(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl TransitionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            TransitionError::UnknownPlan(_) => StatusCode::NOT_FOUND,
            TransitionError::TrialReversionForbidden => StatusCode::FORBIDDEN,
            TransitionError::PaymentPending => StatusCode::CONFLICT,
            TransitionError::PaymentInitiationFailed(_) => StatusCode::BAD_GATEWAY,
            TransitionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type TransitionResult<T> = std::result::Result<T, TransitionError>;

/// Terminal result of one transition request. `QuotaConflict` is not a
/// failure: the caller resolves it via quota remediation and resubmits.
#[derive(Debug)]
pub enum TransitionOutcome {
    Success {
        plan_slug: String,
    },
    PaymentRequired {
        checkout_url: String,
    },
    QuotaConflict {
        resources: Vec<ServiceSummary>,
        max_allowed: usize,
    },
}

pub struct PlanTransitionUseCase<S, R, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ServiceRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    service_repo: Arc<R>,
    payment_gateway: Arc<G>,
    catalog: Arc<PlanCatalog>,
}

impl<S, R, G> PlanTransitionUseCase<S, R, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ServiceRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        service_repo: Arc<R>,
        payment_gateway: Arc<G>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            subscription_repo,
            service_repo,
            payment_gateway,
            catalog,
        }
    }

    pub async fn request_transition(
        &self,
        professional_id: Uuid,
        target_slug: &str,
        is_admin: bool,
    ) -> TransitionResult<TransitionOutcome> {
        info!(
            %professional_id,
            target_slug,
            is_admin,
            "plan_transitions: transition requested"
        );

        let target = *self.catalog.get(target_slug).ok_or_else(|| {
            let err = TransitionError::UnknownPlan(target_slug.to_string());
            warn!(
                %professional_id,
                target_slug,
                status = err.status_code().as_u16(),
                "plan_transitions: unknown target plan"
            );
            err
        })?;

        let row = self
            .subscription_repo
            .find_by_professional(professional_id)
            .await
            .map_err(|err| {
                error!(
                    %professional_id,
                    db_error = ?err,
                    "plan_transitions: failed to load subscription"
                );
                TransitionError::Internal(err)
            })?;

        // A cancelled row no longer binds the professional to a plan.
        let current = row
            .as_ref()
            .filter(|row| SubscriptionStatus::from_str(&row.status) != SubscriptionStatus::Cancelled);

        if let Some(current) = current {
            match SubscriptionStatus::from_str(&current.status) {
                SubscriptionStatus::Pending => {
                    if current.plan_slug == target.slug {
                        if let Some(checkout_url) = current.checkout_url.clone() {
                            info!(
                                %professional_id,
                                target_slug,
                                "plan_transitions: transition already pending, returning stored checkout"
                            );
                            return Ok(TransitionOutcome::PaymentRequired { checkout_url });
                        }
                    }
                    let err = TransitionError::PaymentPending;
                    warn!(
                        %professional_id,
                        target_slug,
                        pending_slug = %current.plan_slug,
                        status = err.status_code().as_u16(),
                        "plan_transitions: rejecting transition while payment is outstanding"
                    );
                    return Err(err);
                }
                // Paused and suspended rows still bind the professional to
                // their plan; re-selecting it must not open a new checkout.
                SubscriptionStatus::Active
                | SubscriptionStatus::Paused
                | SubscriptionStatus::Suspended
                    if current.plan_slug == target.slug =>
                {
                    info!(
                        %professional_id,
                        target_slug,
                        "plan_transitions: already on target plan, nothing to do"
                    );
                    return Ok(TransitionOutcome::Success {
                        plan_slug: target.slug.to_string(),
                    });
                }
                _ => {}
            }
        }

        let current_plan = current.and_then(|row| self.catalog.get(&row.plan_slug));

        if target.slug == TRIAL_PLAN_SLUG && !is_admin {
            if let Some(current_plan) = current_plan {
                if !current_plan.is_free() {
                    let err = TransitionError::TrialReversionForbidden;
                    warn!(
                        %professional_id,
                        current_slug = current_plan.slug,
                        status = err.status_code().as_u16(),
                        "plan_transitions: paid plan cannot revert to trial"
                    );
                    return Err(err);
                }
            }
        }

        // Quota is checked strictly before any billing side effect, so no
        // checkout is ever created for a transition that cannot complete.
        if let Some(max_allowed) = target.max_services {
            let owned = self
                .service_repo
                .list_by_professional(professional_id)
                .await
                .map_err(|err| {
                    error!(
                        %professional_id,
                        db_error = ?err,
                        "plan_transitions: failed to load service inventory"
                    );
                    TransitionError::Internal(err)
                })?;

            if owned.len() > max_allowed {
                info!(
                    %professional_id,
                    target_slug,
                    owned = owned.len(),
                    max_allowed,
                    "plan_transitions: target quota exceeded, remediation required"
                );
                return Ok(TransitionOutcome::QuotaConflict {
                    resources: owned.into_iter().map(ServiceSummary::from).collect(),
                    max_allowed,
                });
            }
        }

        if let Some(current_plan) = current_plan {
            debug!(
                %professional_id,
                from = current_plan.slug,
                to = target.slug,
                direction = ?self.catalog.direction(current_plan, &target),
                "plan_transitions: direction resolved"
            );
        }

        if target.is_free() {
            let trial_ends_at = target.trial_days.map(|days| Utc::now() + Duration::days(days));
            self.subscription_repo
                .upsert(UpsertSubscriptionEntity {
                    professional_id,
                    plan_slug: target.slug.to_string(),
                    status: SubscriptionStatus::Active.to_string(),
                    amount_minor: 0,
                    trial_ends_at,
                    next_billing_date: None,
                    last_payment_date: None,
                    cancelled_at: None,
                    cancellation_reason_code: None,
                    cancellation_reason: None,
                    gateway_reference: None,
                    checkout_url: None,
                })
                .await
                .map_err(|err| {
                    error!(
                        %professional_id,
                        target_slug,
                        db_error = ?err,
                        "plan_transitions: failed to activate free plan"
                    );
                    TransitionError::Internal(err)
                })?;

            info!(%professional_id, target_slug, "plan_transitions: free plan activated");
            return Ok(TransitionOutcome::Success {
                plan_slug: target.slug.to_string(),
            });
        }

        let checkout = self
            .payment_gateway
            .create_recurring_checkout(professional_id, target)
            .await
            .map_err(|err| {
                let err = TransitionError::PaymentInitiationFailed(err);
                error!(
                    %professional_id,
                    target_slug,
                    status = err.status_code().as_u16(),
                    "plan_transitions: checkout initiation failed"
                );
                err
            })?;

        self.subscription_repo
            .upsert(UpsertSubscriptionEntity {
                professional_id,
                plan_slug: target.slug.to_string(),
                status: SubscriptionStatus::Pending.to_string(),
                amount_minor: target.price_minor,
                trial_ends_at: None,
                next_billing_date: None,
                last_payment_date: None,
                cancelled_at: None,
                cancellation_reason_code: None,
                cancellation_reason: None,
                gateway_reference: Some(checkout.reference.clone()),
                checkout_url: Some(checkout.checkout_url.clone()),
            })
            .await
            .map_err(|err| {
                error!(
                    %professional_id,
                    target_slug,
                    db_error = ?err,
                    "plan_transitions: failed to persist pending transition"
                );
                TransitionError::Internal(err)
            })?;

        info!(
            %professional_id,
            target_slug,
            gateway_reference = %checkout.reference,
            "plan_transitions: checkout created, awaiting payment confirmation"
        );
        Ok(TransitionOutcome::PaymentRequired {
            checkout_url: checkout.checkout_url,
        })
    }

    /// Entry point for gateway webhooks. `preapproval` notifications drive
    /// the subscription status; `payment` notifications refresh the billing
    /// window of an already-known preapproval.
    pub async fn handle_payment_notification(
        &self,
        kind: &str,
        resource_id: &str,
    ) -> TransitionResult<()> {
        info!(kind, resource_id, "plan_transitions: gateway notification received");

        match kind {
            "preapproval" => {
                let preapproval = self
                    .payment_gateway
                    .fetch_preapproval(resource_id.to_string())
                    .await
                    .map_err(|err| {
                        error!(
                            resource_id,
                            error = ?err,
                            "plan_transitions: failed to fetch preapproval from gateway"
                        );
                        TransitionError::Internal(err)
                    })?;

                let reference = preapproval
                    .preapproval_plan_id
                    .as_deref()
                    .unwrap_or(resource_id);
                self.apply_preapproval_status(reference, &preapproval.status)
                    .await
            }
            "payment" => {
                let payment = self
                    .payment_gateway
                    .fetch_payment(resource_id.to_string())
                    .await
                    .map_err(|err| {
                        error!(
                            resource_id,
                            error = ?err,
                            "plan_transitions: failed to fetch payment from gateway"
                        );
                        TransitionError::Internal(err)
                    })?;

                let Some(preapproval_id) = payment.preapproval_id else {
                    debug!(resource_id, "plan_transitions: payment without preapproval, ignoring");
                    return Ok(());
                };
                if payment.status != "approved" {
                    debug!(
                        resource_id,
                        payment_status = %payment.status,
                        "plan_transitions: ignoring non-approved payment"
                    );
                    return Ok(());
                }

                // The payment carries the preapproval id, but rows are keyed
                // on the plan id the checkout was created with. Resolve it
                // the same way the preapproval branch does.
                let preapproval = self
                    .payment_gateway
                    .fetch_preapproval(preapproval_id.clone())
                    .await
                    .map_err(|err| {
                        error!(
                            resource_id,
                            preapproval_id,
                            error = ?err,
                            "plan_transitions: failed to resolve preapproval for payment"
                        );
                        TransitionError::Internal(err)
                    })?;
                let reference = preapproval
                    .preapproval_plan_id
                    .as_deref()
                    .unwrap_or(&preapproval_id);

                self.confirm_payment(reference).await
            }
            other => {
                debug!(kind = other, resource_id, "plan_transitions: ignoring notification kind");
                Ok(())
            }
        }
    }

    async fn apply_preapproval_status(
        &self,
        gateway_reference: &str,
        status: &str,
    ) -> TransitionResult<()> {
        match status {
            "authorized" => self.confirm_payment(gateway_reference).await,
            "paused" => {
                self.flip_status(gateway_reference, SubscriptionStatus::Paused, None)
                    .await
            }
            "cancelled" => {
                self.flip_status(
                    gateway_reference,
                    SubscriptionStatus::Cancelled,
                    Some(Utc::now()),
                )
                .await
            }
            other => {
                debug!(
                    gateway_reference,
                    preapproval_status = other,
                    "plan_transitions: ignoring preapproval status"
                );
                Ok(())
            }
        }
    }

    async fn confirm_payment(&self, gateway_reference: &str) -> TransitionResult<()> {
        let now = Utc::now();
        let updated = self
            .subscription_repo
            .record_payment_confirmation(
                gateway_reference.to_string(),
                now,
                now + Duration::days(BILLING_CYCLE_DAYS),
            )
            .await
            .map_err(|err| {
                error!(
                    gateway_reference,
                    db_error = ?err,
                    "plan_transitions: failed to record payment confirmation"
                );
                TransitionError::Internal(err)
            })?;

        match updated {
            Some(row) => info!(
                professional_id = %row.professional_id,
                plan_slug = %row.plan_slug,
                gateway_reference,
                "plan_transitions: payment confirmed, subscription active"
            ),
            // The gateway retries webhooks; an unknown reference is theirs,
            // not ours, so it is acknowledged and dropped.
            None => warn!(
                gateway_reference,
                "plan_transitions: payment confirmation for unknown subscription"
            ),
        }
        Ok(())
    }

    async fn flip_status(
        &self,
        gateway_reference: &str,
        status: SubscriptionStatus,
        cancelled_at: Option<chrono::DateTime<Utc>>,
    ) -> TransitionResult<()> {
        let updated = self
            .subscription_repo
            .set_status_by_gateway_reference(gateway_reference.to_string(), status, cancelled_at)
            .await
            .map_err(|err| {
                error!(
                    gateway_reference,
                    db_error = ?err,
                    "plan_transitions: failed to update subscription status"
                );
                TransitionError::Internal(err)
            })?;

        match updated {
            Some(row) => info!(
                professional_id = %row.professional_id,
                gateway_reference,
                new_status = %status,
                "plan_transitions: subscription status updated from gateway"
            ),
            None => warn!(
                gateway_reference,
                new_status = %status,
                "plan_transitions: status change for unknown subscription"
            ),
        }
        Ok(())
    }
}
