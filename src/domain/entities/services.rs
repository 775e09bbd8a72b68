use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::services;

/// A service offering published by a professional. Counts toward the active
/// plan's quota.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = services)]
pub struct ServiceEntity {
    pub id: i64,
    pub professional_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
