//! Outbound HTTP client for the payment provider. Grounded on
//! `original_source/app/api/routers/intents.py`'s `stripe.checkout.Session.create`
//! call — there is no official async Stripe SDK in this stack, so the
//! Checkout Session create request is built as a raw form POST the way
//! the provider's own HTTP API expects it.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    pub intent_id: i32,
    pub station_id: i32,
    pub connector_id: i32,
    pub email: String,
    /// Minor-unit amount already multiplied by 100, per the provider's
    /// HUF convention (spec §4.E step 3).
    pub unit_amount_minor: i64,
    pub success_url: String,
    pub cancel_url: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum PaymentProviderError {
    #[error("payment provider request failed: {0}")]
    Request(String),
    #[error("payment provider returned an error response: {0}")]
    Provider(String),
}

/// The seam `PaymentBridge` calls through — lets tests substitute a stub
/// instead of reaching the real Stripe API.
#[async_trait]
pub trait PaymentProviderClient: Send + Sync {
    async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> Result<CheckoutSession, PaymentProviderError>;
}

pub struct StripeClient {
    secret_key: String,
    http: reqwest::Client,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[async_trait]
impl PaymentProviderClient for StripeClient {
    async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> Result<CheckoutSession, PaymentProviderError> {
        let intent_id = params.intent_id.to_string();
        let station_id = params.station_id.to_string();
        let connector_id = params.connector_id.to_string();
        let amount = params.unit_amount_minor.to_string();

        // Stripe's form API expects bracket-indexed keys for nested
        // structures; serde_urlencoded happily serializes a flat list of
        // (key, value) pairs built by hand.
        let form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", &params.success_url),
            ("cancel_url", &params.cancel_url),
            ("customer_email", &params.email),
            ("client_reference_id", &intent_id),
            ("metadata[intent_id]", &intent_id),
            ("metadata[charge_point_id]", &station_id),
            ("metadata[connector_id]", &connector_id),
            ("payment_intent_data[metadata][intent_id]", &intent_id),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", "huf"),
            (
                "line_items[0][price_data][product_data][name]",
                "EV charging hold (deposit)",
            ),
            ("line_items[0][price_data][unit_amount]", &amount),
        ];

        let response = self
            .http
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .basic_auth(&self.secret_key, Some(""))
            .header("Idempotency-Key", &params.idempotency_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentProviderError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentProviderError::Request(e.to_string()))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<StripeErrorEnvelope>(&body)
                .ok()
                .and_then(|env| env.error.message.or(env.error.kind))
                .unwrap_or(body);
            return Err(PaymentProviderError::Provider(reason));
        }

        let parsed: CheckoutSessionResponse = serde_json::from_str(&body)
            .map_err(|e| PaymentProviderError::Request(format!("malformed response: {e}")))?;

        Ok(CheckoutSession {
            id: parsed.id,
            url: parsed.url,
        })
    }
}
