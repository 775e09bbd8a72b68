use serde::Serialize;

use crate::domain::entities::services::ServiceEntity;

/// What the caller needs to choose which offerings to retain during a
/// quota conflict.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceSummary {
    pub id: i64,
    pub title: String,
}

impl From<ServiceEntity> for ServiceSummary {
    fn from(entity: ServiceEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
        }
    }
}
