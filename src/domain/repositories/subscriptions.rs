use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{SubscriptionEntity, UpsertSubscriptionEntity},
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    async fn find_by_professional(
        &self,
        professional_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Writes the full new state of the professional's single row, creating
    /// it when absent. Keyed on `professional_id`.
    async fn upsert(&self, record: UpsertSubscriptionEntity) -> Result<SubscriptionEntity>;

    async fn record_cancellation(
        &self,
        professional_id: Uuid,
        reason_code: String,
        reason: String,
        cancelled_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Flips a pending row to active once the gateway reports the payment,
    /// stamping the billing window. Returns `None` for unknown references.
    async fn record_payment_confirmation(
        &self,
        gateway_reference: String,
        last_payment_date: DateTime<Utc>,
        next_billing_date: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn set_status_by_gateway_reference(
        &self,
        gateway_reference: String,
        status: SubscriptionStatus,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Result<Option<SubscriptionEntity>>;
}
