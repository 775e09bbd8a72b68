use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, prelude::*};
use uuid::Uuid;

use crate::{
    domain::{entities::services::ServiceEntity, repositories::services::ServiceRepository},
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::services},
};

pub struct ServicePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ServicePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ServiceRepository for ServicePostgres {
    async fn list_by_professional(&self, professional_id: Uuid) -> Result<Vec<ServiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = services::table
            .filter(services::professional_id.eq(professional_id))
            .order(services::created_at.asc())
            .select(ServiceEntity::as_select())
            .load::<ServiceEntity>(&mut conn)?;

        Ok(results)
    }

    async fn delete_except(&self, professional_id: Uuid, keep_ids: Vec<i64>) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(
            services::table
                .filter(services::professional_id.eq(professional_id))
                .filter(services::id.ne_all(keep_ids)),
        )
        .execute(&mut conn)?;

        Ok(deleted)
    }
}
