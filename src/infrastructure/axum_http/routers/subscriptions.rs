use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    application::usecases::{
        cancellations::CancellationUseCase,
        plan_transitions::{PaymentGateway, PlanTransitionUseCase, TransitionOutcome},
        quota_remediation::QuotaRemediationUseCase,
        subscription_overview::SubscriptionOverviewUseCase,
    },
    auth::AuthProfessional,
    domain::{
        repositories::{services::ServiceRepository, subscriptions::SubscriptionRepository},
        value_objects::{
            plans::PlanCatalog,
            services::ServiceSummary,
            subscriptions::{CancelSubscriptionRequest, ChangePlanRequest, RetainServicesRequest},
        },
    },
    infrastructure::{
        axum_http::error_responses::error_response,
        payments::mercado_pago::MercadoPagoClient,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{services::ServicePostgres, subscriptions::SubscriptionPostgres},
        },
    },
};

pub struct SubscriptionsState<S, R, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ServiceRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub transitions: PlanTransitionUseCase<S, R, G>,
    pub remediation: QuotaRemediationUseCase<R>,
    pub cancellation: CancellationUseCase<S>,
    pub overview: SubscriptionOverviewUseCase<S>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    catalog: Arc<PlanCatalog>,
    payment_gateway: Arc<MercadoPagoClient>,
) -> Router {
    let subscription_repository = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));
    let service_repository = Arc::new(ServicePostgres::new(Arc::clone(&db_pool)));

    let state = SubscriptionsState {
        transitions: PlanTransitionUseCase::new(
            Arc::clone(&subscription_repository),
            Arc::clone(&service_repository),
            payment_gateway,
            Arc::clone(&catalog),
        ),
        remediation: QuotaRemediationUseCase::new(Arc::clone(&service_repository)),
        cancellation: CancellationUseCase::new(Arc::clone(&subscription_repository)),
        overview: SubscriptionOverviewUseCase::new(subscription_repository, catalog),
    };

    Router::new()
        .route("/change-plan", post(change_plan))
        .route("/retention", post(apply_retention))
        .route("/cancel", post(cancel_subscription))
        .route("/me", get(current_subscription))
        .route("/webhook", post(payment_webhook))
        .with_state(Arc::new(state))
}

/// Wire shape of a transition result, tagged so clients can branch on the
/// outcome without inspecting optional fields.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionResponse {
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

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        match outcome {
            TransitionOutcome::Success { plan_slug } => TransitionResponse::Success { plan_slug },
            TransitionOutcome::PaymentRequired { checkout_url } => {
                TransitionResponse::PaymentRequired { checkout_url }
            }
            TransitionOutcome::QuotaConflict {
                resources,
                max_allowed,
            } => TransitionResponse::QuotaConflict {
                resources,
                max_allowed,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RetentionResponse {
    pub retained: usize,
    pub removed: usize,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub data: Option<WebhookData>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub id: Option<Value>,
}

pub async fn change_plan<S, R, G>(
    State(state): State<Arc<SubscriptionsState<S, R, G>>>,
    auth: AuthProfessional,
    Json(body): Json<ChangePlanRequest>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ServiceRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match state
        .transitions
        .request_transition(auth.professional_id, &body.target_slug, auth.is_admin)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(TransitionResponse::from(outcome))).into_response(),
        Err(e) => error_response(e.status_code(), e.to_string()),
    }
}

pub async fn apply_retention<S, R, G>(
    State(state): State<Arc<SubscriptionsState<S, R, G>>>,
    auth: AuthProfessional,
    Json(body): Json<RetainServicesRequest>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ServiceRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match state
        .remediation
        .apply_retention(auth.professional_id, body.retain_ids, body.max_allowed)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(RetentionResponse {
                retained: outcome.retained,
                removed: outcome.removed,
            }),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.to_string()),
    }
}

pub async fn cancel_subscription<S, R, G>(
    State(state): State<Arc<SubscriptionsState<S, R, G>>>,
    auth: AuthProfessional,
    Json(body): Json<CancelSubscriptionRequest>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ServiceRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match state
        .cancellation
        .cancel(
            auth.professional_id,
            &body.reason_code,
            body.reason_text.as_deref(),
        )
        .await
    {
        Ok(()) => (StatusCode::OK, "Subscription cancelled").into_response(),
        Err(e) => error_response(e.status_code(), e.to_string()),
    }
}

pub async fn current_subscription<S, R, G>(
    State(state): State<Arc<SubscriptionsState<S, R, G>>>,
    auth: AuthProfessional,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ServiceRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match state.overview.snapshot(auth.professional_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Unauthenticated gateway callback. The gateway retries on non-2xx, so this
/// always acknowledges and reports the handling result in the body.
pub async fn payment_webhook<S, R, G>(
    State(state): State<Arc<SubscriptionsState<S, R, G>>>,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    R: ServiceRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let kind = payload.kind.unwrap_or_default();
    let resource_id = payload.data.and_then(|data| data.id).map(|id| match id {
        Value::String(id) => id,
        other => other.to_string(),
    });

    let Some(resource_id) = resource_id else {
        warn!(kind, "subscriptions router: webhook without a resource id");
        return (StatusCode::OK, Json(serde_json::json!({ "status": "ignored" })))
            .into_response();
    };

    match state
        .transitions
        .handle_payment_notification(&kind, &resource_id)
        .await
    {
        Ok(()) => {
            (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
        }
        Err(e) => {
            warn!(kind, resource_id, error = %e, "subscriptions router: webhook handling failed");
            (StatusCode::OK, Json(serde_json::json!({ "status": "error" }))).into_response()
        }
    }
}
