use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::services::ServiceEntity;

#[async_trait]
#[automock]
pub trait ServiceRepository {
    async fn list_by_professional(&self, professional_id: Uuid) -> Result<Vec<ServiceEntity>>;

    /// Deletes every offering of the professional that is not in `keep_ids`
    /// and returns how many rows went away. Deleting nothing is not an error.
    async fn delete_except(&self, professional_id: Uuid, keep_ids: Vec<i64>) -> Result<usize>;
}
