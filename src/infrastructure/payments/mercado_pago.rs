use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::usecases::plan_transitions::{
        CheckoutHandle, PaymentDetails, PaymentGateway, PreapprovalDetails,
    },
    config::config_model::MercadoPago,
    domain::value_objects::plans::Plan,
};

/// Minimal Mercado Pago client built on reqwest. Recurring plans live under
/// the preapproval_plan API; one-off charges surface as payments.
pub struct MercadoPagoClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
    back_url: String,
}

#[derive(Debug, Deserialize)]
struct PreapprovalPlanResponse {
    id: String,
    init_point: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreapprovalResponse {
    status: String,
    preapproval_plan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    status: String,
    preapproval_id: Option<String>,
}

impl MercadoPagoClient {
    pub fn new(config: &MercadoPago) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            access_token: config.access_token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            back_url: config.back_url.clone(),
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            mp_request_id = ?request_id,
            response_body = %body,
            context = %context,
            "mercado pago api request failed"
        );

        anyhow::bail!(
            "Mercado Pago API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    async fn create_recurring_checkout(
        &self,
        professional_id: Uuid,
        plan: Plan,
    ) -> Result<CheckoutHandle> {
        // Preapproval plan docs:
        // https://www.mercadopago.com.br/developers/en/reference/subscriptions/_preapproval_plan/post
        let body = json!({
            "reason": format!("Plano {} - ProMarket", plan.name),
            "auto_recurring": {
                "frequency": 1,
                "frequency_type": "months",
                "transaction_amount": f64::from(plan.price_minor) / 100.0,
                "currency_id": "BRL",
            },
            "back_url": self.back_url,
            "external_reference": professional_id.to_string(),
        });

        let resp = self
            .http
            .post(format!("{}/preapproval_plan", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create preapproval plan").await?;

        let parsed: PreapprovalPlanResponse = resp.json().await?;
        let Some(checkout_url) = parsed.init_point else {
            anyhow::bail!(
                "Mercado Pago returned preapproval plan {} without an init_point",
                parsed.id
            );
        };

        info!(
            %professional_id,
            plan_slug = plan.slug,
            preapproval_plan_id = %parsed.id,
            "mercado pago preapproval plan created"
        );

        Ok(CheckoutHandle {
            reference: parsed.id,
            checkout_url,
        })
    }

    async fn fetch_preapproval(&self, preapproval_id: String) -> Result<PreapprovalDetails> {
        let resp = self
            .http
            .get(format!("{}/preapproval/{}", self.base_url, preapproval_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "fetch preapproval").await?;

        let parsed: PreapprovalResponse = resp.json().await?;
        Ok(PreapprovalDetails {
            status: parsed.status,
            preapproval_plan_id: parsed.preapproval_plan_id,
        })
    }

    async fn fetch_payment(&self, payment_id: String) -> Result<PaymentDetails> {
        let resp = self
            .http
            .get(format!("{}/v1/payments/{}", self.base_url, payment_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "fetch payment").await?;

        let parsed: PaymentResponse = resp.json().await?;
        Ok(PaymentDetails {
            status: parsed.status,
            preapproval_id: parsed.preapproval_id,
        })
    }
}
