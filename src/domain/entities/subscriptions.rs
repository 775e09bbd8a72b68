use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::subscriptions;

/// The single billing record of a professional. Cancellation flips the
/// status, it never deletes the row.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: i64,
    pub professional_id: Uuid,
    pub plan_slug: String,
    pub status: String,
    pub amount_minor: i32,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason_code: Option<String>,
    pub cancellation_reason: Option<String>,
    pub gateway_reference: Option<String>,
    pub checkout_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full new state of the row on a plan transition. `None` fields are written
/// as NULL so a fresh assignment wipes stale cancellation/gateway data.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = subscriptions)]
#[diesel(treat_none_as_null = true)]
pub struct UpsertSubscriptionEntity {
    pub professional_id: Uuid,
    pub plan_slug: String,
    pub status: String,
    pub amount_minor: i32,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub next_billing_date: Option<DateTime<Utc>>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason_code: Option<String>,
    pub cancellation_reason: Option<String>,
    pub gateway_reference: Option<String>,
    pub checkout_url: Option<String>,
}
