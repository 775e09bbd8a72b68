use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::repositories::services::ServiceRepository;

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("expected exactly {expected} services to retain, got {actual}")]
    RetentionCountMismatch { expected: usize, actual: usize },
    #[error("service {0} does not belong to the requesting professional")]
    ForbiddenResource(i64),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RetentionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            RetentionError::RetentionCountMismatch { .. } => StatusCode::BAD_REQUEST,
            RetentionError::ForbiddenResource(_) => StatusCode::FORBIDDEN,
            RetentionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RetentionOutcome {
    pub retained: usize,
    pub removed: usize,
}

pub struct QuotaRemediationUseCase<R>
where
    R: ServiceRepository + Send + Sync + 'static,
{
    service_repo: Arc<R>,
}

impl<R> QuotaRemediationUseCase<R>
where
    R: ServiceRepository + Send + Sync + 'static,
{
    pub fn new(service_repo: Arc<R>) -> Self {
        Self { service_repo }
    }

    /// Shrinks the professional's inventory to exactly the retain set.
    /// Validation happens against the live inventory before any deletion,
    /// and the delete itself is a single keep-these statement, so a retried
    /// request after a partial failure converges to the same end state.
    pub async fn apply_retention(
        &self,
        professional_id: Uuid,
        retain_ids: Vec<i64>,
        max_allowed: usize,
    ) -> Result<RetentionOutcome, RetentionError> {
        let retain: BTreeSet<i64> = retain_ids.into_iter().collect();

        info!(
            %professional_id,
            retained = retain.len(),
            max_allowed,
            "quota_remediation: retention requested"
        );

        if retain.len() != max_allowed {
            let err = RetentionError::RetentionCountMismatch {
                expected: max_allowed,
                actual: retain.len(),
            };
            warn!(
                %professional_id,
                expected = max_allowed,
                actual = retain.len(),
                status = err.status_code().as_u16(),
                "quota_remediation: retain set has the wrong size"
            );
            return Err(err);
        }

        let owned = self
            .service_repo
            .list_by_professional(professional_id)
            .await
            .map_err(|err| {
                error!(
                    %professional_id,
                    db_error = ?err,
                    "quota_remediation: failed to load service inventory"
                );
                RetentionError::Internal(err)
            })?;
        let owned_ids: BTreeSet<i64> = owned.iter().map(|service| service.id).collect();

        if let Some(stranger) = retain.iter().find(|id| !owned_ids.contains(id)) {
            let err = RetentionError::ForbiddenResource(*stranger);
            warn!(
                %professional_id,
                service_id = stranger,
                status = err.status_code().as_u16(),
                "quota_remediation: retain set references a foreign service"
            );
            return Err(err);
        }

        let removed = self
            .service_repo
            .delete_except(professional_id, retain.iter().copied().collect())
            .await
            .map_err(|err| {
                error!(
                    %professional_id,
                    db_error = ?err,
                    "quota_remediation: failed to delete excess services"
                );
                RetentionError::Internal(err)
            })?;

        info!(
            %professional_id,
            retained = retain.len(),
            removed,
            "quota_remediation: inventory reduced"
        );

        Ok(RetentionOutcome {
            retained: retain.len(),
            removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::services::ServiceEntity, repositories::services::MockServiceRepository,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn sample_services(professional_id: Uuid, ids: &[i64]) -> Vec<ServiceEntity> {
        ids.iter()
            .map(|id| ServiceEntity {
                id: *id,
                professional_id,
                title: format!("Service {}", id),
                created_at: Utc::now(),
            })
            .collect()
    }

    #[tokio::test]
    async fn wrong_retain_count_is_rejected_before_touching_the_inventory() {
        let professional_id = Uuid::new_v4();
        // No expectations: listing or deleting would panic.
        let uc = QuotaRemediationUseCase::new(Arc::new(MockServiceRepository::new()));

        let err = uc
            .apply_retention(professional_id, vec![1, 2, 3], 5)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RetentionError::RetentionCountMismatch {
                expected: 5,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn duplicate_ids_cannot_pad_the_retain_set() {
        let professional_id = Uuid::new_v4();
        let uc = QuotaRemediationUseCase::new(Arc::new(MockServiceRepository::new()));

        let err = uc
            .apply_retention(professional_id, vec![1, 1, 2, 2, 3], 5)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RetentionError::RetentionCountMismatch {
                expected: 5,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn foreign_service_in_the_retain_set_is_forbidden() {
        let professional_id = Uuid::new_v4();
        let mut service_repo = MockServiceRepository::new();
        let owned = sample_services(professional_id, &[1, 2, 3]);
        service_repo
            .expect_list_by_professional()
            .with(eq(professional_id))
            .returning(move |_| {
                let owned = owned.clone();
                Box::pin(async move { Ok(owned) })
            });

        let uc = QuotaRemediationUseCase::new(Arc::new(service_repo));

        let err = uc
            .apply_retention(professional_id, vec![1, 99], 2)
            .await
            .unwrap_err();

        assert!(matches!(err, RetentionError::ForbiddenResource(99)));
    }

    #[tokio::test]
    async fn excess_services_are_deleted_in_one_statement() {
        let professional_id = Uuid::new_v4();
        let mut service_repo = MockServiceRepository::new();
        let owned = sample_services(professional_id, &[1, 2, 3, 4, 5, 6, 7, 8]);
        service_repo
            .expect_list_by_professional()
            .with(eq(professional_id))
            .returning(move |_| {
                let owned = owned.clone();
                Box::pin(async move { Ok(owned) })
            });
        service_repo
            .expect_delete_except()
            .withf(move |id, keep| {
                *id == professional_id && *keep == vec![1, 2, 3, 4, 5]
            })
            .returning(|_, _| Box::pin(async { Ok(3) }));

        let uc = QuotaRemediationUseCase::new(Arc::new(service_repo));

        let outcome = uc
            .apply_retention(professional_id, vec![5, 4, 3, 2, 1], 5)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RetentionOutcome {
                retained: 5,
                removed: 3
            }
        );
    }

    #[tokio::test]
    async fn rerunning_the_same_retention_converges_with_nothing_left_to_delete() {
        let professional_id = Uuid::new_v4();
        let mut service_repo = MockServiceRepository::new();
        let owned = sample_services(professional_id, &[1, 2, 3, 4, 5]);
        service_repo
            .expect_list_by_professional()
            .returning(move |_| {
                let owned = owned.clone();
                Box::pin(async move { Ok(owned) })
            });
        service_repo
            .expect_delete_except()
            .returning(|_, _| Box::pin(async { Ok(0) }));

        let uc = QuotaRemediationUseCase::new(Arc::new(service_repo));

        let outcome = uc
            .apply_retention(professional_id, vec![1, 2, 3, 4, 5], 5)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RetentionOutcome {
                retained: 5,
                removed: 0
            }
        );
    }

    #[tokio::test]
    async fn empty_retain_set_clears_the_inventory_when_quota_is_zero() {
        let professional_id = Uuid::new_v4();
        let mut service_repo = MockServiceRepository::new();
        let owned = sample_services(professional_id, &[7, 8]);
        service_repo
            .expect_list_by_professional()
            .returning(move |_| {
                let owned = owned.clone();
                Box::pin(async move { Ok(owned) })
            });
        service_repo
            .expect_delete_except()
            .withf(move |id, keep| *id == professional_id && keep.is_empty())
            .returning(|_, _| Box::pin(async { Ok(2) }));

        let uc = QuotaRemediationUseCase::new(Arc::new(service_repo));

        let outcome = uc
            .apply_retention(professional_id, Vec::new(), 0)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RetentionOutcome {
                retained: 0,
                removed: 2
            }
        );
    }
}
