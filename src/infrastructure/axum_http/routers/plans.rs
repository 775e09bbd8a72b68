use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::{
    application::usecases::subscription_overview::SubscriptionOverviewUseCase,
    auth::AuthProfessional,
    domain::{
        repositories::subscriptions::SubscriptionRepository, value_objects::plans::PlanCatalog,
    },
    infrastructure::{
        axum_http::error_responses::error_response,
        postgres::{
            postgres_connection::PgPoolSquad, repositories::subscriptions::SubscriptionPostgres,
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, catalog: Arc<PlanCatalog>) -> Router {
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let overview_usecase =
        SubscriptionOverviewUseCase::new(Arc::new(subscription_repository), catalog);

    Router::new()
        .route("/", get(list_plans))
        .route("/me/features", get(plan_features))
        .with_state(Arc::new(overview_usecase))
}

pub async fn list_plans<S>(
    State(overview_usecase): State<Arc<SubscriptionOverviewUseCase<S>>>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    Json(overview_usecase.list_plans()).into_response()
}

pub async fn plan_features<S>(
    State(overview_usecase): State<Arc<SubscriptionOverviewUseCase<S>>>,
    auth: AuthProfessional,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match overview_usecase.plan_features(auth.professional_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
