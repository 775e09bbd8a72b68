use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::subscriptions::SubscriptionRepository,
    value_objects::enums::{
        cancellation_reasons::CancellationReason, subscription_statuses::SubscriptionStatus,
    },
};

#[derive(Debug, Error)]
pub enum CancellationError {
    #[error("invalid cancellation reason: {0}")]
    InvalidCancellationReason(String),
    #[error("no subscription found for this professional")]
    SubscriptionNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CancellationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CancellationError::InvalidCancellationReason(_) => StatusCode::BAD_REQUEST,
            CancellationError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            CancellationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct CancellationUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
}

impl<S> CancellationUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>) -> Self {
        Self { subscription_repo }
    }

    /// Cancels the professional's subscription. The request is validated
    /// in full before any write, and cancelling an already-cancelled
    /// subscription succeeds without overwriting the recorded reason.
    pub async fn cancel(
        &self,
        professional_id: Uuid,
        reason_code: &str,
        reason_text: Option<&str>,
    ) -> Result<(), CancellationError> {
        info!(%professional_id, reason_code, "cancellations: cancellation requested");

        let reason = CancellationReason::from_str(reason_code).ok_or_else(|| {
            let err = CancellationError::InvalidCancellationReason(reason_code.to_string());
            warn!(
                %professional_id,
                reason_code,
                status = err.status_code().as_u16(),
                "cancellations: unknown reason code"
            );
            err
        })?;

        let stored_reason = match reason {
            CancellationReason::Other => {
                let text = reason_text.map(str::trim).unwrap_or_default();
                if text.is_empty() {
                    let err =
                        CancellationError::InvalidCancellationReason(reason_code.to_string());
                    warn!(
                        %professional_id,
                        status = err.status_code().as_u16(),
                        "cancellations: reason code 'other' requires free-form text"
                    );
                    return Err(err);
                }
                text.to_string()
            }
            _ => reason.description().to_string(),
        };

        let row = self
            .subscription_repo
            .find_by_professional(professional_id)
            .await
            .map_err(|err| {
                error!(
                    %professional_id,
                    db_error = ?err,
                    "cancellations: failed to load subscription"
                );
                CancellationError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = CancellationError::SubscriptionNotFound;
                warn!(
                    %professional_id,
                    status = err.status_code().as_u16(),
                    "cancellations: nothing to cancel"
                );
                err
            })?;

        if SubscriptionStatus::from_str(&row.status) == SubscriptionStatus::Cancelled {
            info!(
                %professional_id,
                "cancellations: subscription already cancelled, keeping original reason"
            );
            return Ok(());
        }

        self.subscription_repo
            .record_cancellation(professional_id, reason.to_string(), stored_reason, Utc::now())
            .await
            .map_err(|err| {
                error!(
                    %professional_id,
                    db_error = ?err,
                    "cancellations: failed to record cancellation"
                );
                CancellationError::Internal(err)
            })?;

        info!(%professional_id, reason_code, "cancellations: subscription cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::subscriptions::SubscriptionEntity,
        repositories::subscriptions::MockSubscriptionRepository,
    };
    use mockall::predicate::eq;

    fn active_subscription(professional_id: Uuid) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: 1,
            professional_id,
            plan_slug: "basic".to_string(),
            status: SubscriptionStatus::Active.to_string(),
            amount_minor: 2990,
            trial_ends_at: None,
            next_billing_date: None,
            last_payment_date: None,
            cancelled_at: None,
            cancellation_reason_code: None,
            cancellation_reason: None,
            gateway_reference: Some("pre_123".to_string()),
            checkout_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn catalog_reason_is_stored_with_its_description() {
        let professional_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let row = active_subscription(professional_id);
        subscription_repo
            .expect_find_by_professional()
            .with(eq(professional_id))
            .returning(move |_| {
                let row = row.clone();
                Box::pin(async move { Ok(Some(row)) })
            });
        subscription_repo
            .expect_record_cancellation()
            .withf(move |id, code, reason, _| {
                *id == professional_id
                    && code == "too-expensive"
                    && reason == CancellationReason::TooExpensive.description()
            })
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));

        let uc = CancellationUseCase::new(Arc::new(subscription_repo));

        uc.cancel(professional_id, "too-expensive", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn other_reason_stores_the_free_form_text_verbatim() {
        let professional_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let row = active_subscription(professional_id);
        subscription_repo
            .expect_find_by_professional()
            .returning(move |_| {
                let row = row.clone();
                Box::pin(async move { Ok(Some(row)) })
            });
        subscription_repo
            .expect_record_cancellation()
            .withf(|_, code, reason, _| code == "other" && reason == "Mudei de cidade")
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));

        let uc = CancellationUseCase::new(Arc::new(subscription_repo));

        uc.cancel(professional_id, "other", Some("Mudei de cidade"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn other_reason_without_text_is_rejected() {
        let professional_id = Uuid::new_v4();
        // Validation fails before any repository call.
        let uc = CancellationUseCase::new(Arc::new(MockSubscriptionRepository::new()));

        let err = uc
            .cancel(professional_id, "other", Some("   "))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CancellationError::InvalidCancellationReason(code) if code == "other"
        ));
    }

    #[tokio::test]
    async fn unknown_reason_code_is_rejected() {
        let professional_id = Uuid::new_v4();
        let uc = CancellationUseCase::new(Arc::new(MockSubscriptionRepository::new()));

        let err = uc
            .cancel(professional_id, "changed-my-mind", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CancellationError::InvalidCancellationReason(code) if code == "changed-my-mind"
        ));
    }

    #[tokio::test]
    async fn cancelling_without_a_subscription_is_not_found() {
        let professional_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_professional()
            .returning(|_| Box::pin(async { Ok(None) }));

        let uc = CancellationUseCase::new(Arc::new(subscription_repo));

        let err = uc
            .cancel(professional_id, "temporary-pause", None)
            .await
            .unwrap_err();

        assert!(matches!(err, CancellationError::SubscriptionNotFound));
    }

    #[tokio::test]
    async fn repeated_cancellation_is_a_noop_that_keeps_the_first_reason() {
        let professional_id = Uuid::new_v4();
        let mut row = active_subscription(professional_id);
        row.status = SubscriptionStatus::Cancelled.to_string();
        row.cancellation_reason_code = Some("too-expensive".to_string());
        row.cancellation_reason =
            Some(CancellationReason::TooExpensive.description().to_string());

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_professional()
            .returning(move |_| {
                let row = row.clone();
                Box::pin(async move { Ok(Some(row)) })
            });
        // record_cancellation has no expectation: a second write would panic.

        let uc = CancellationUseCase::new(Arc::new(subscription_repo));

        uc.cancel(professional_id, "closing-business", None)
            .await
            .unwrap();
    }
}
