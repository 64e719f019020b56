use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppResult;

pub mod metadata;
pub mod signature;

#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Boundary to the external payment processor. The production implementation
/// talks HTTP; tests substitute their own.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount_minor_units: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> AppResult<PaymentIntent>;
}

pub struct HttpPaymentProcessor {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpPaymentProcessor {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
}

#[async_trait]
impl PaymentProcessor for HttpPaymentProcessor {
    async fn create_payment_intent(
        &self,
        amount_minor_units: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> AppResult<PaymentIntent> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".into(), amount_minor_units.to_string()),
            ("currency".into(), currency.to_string()),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let resp = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;

        let intent: IntentResponse = resp.json().await?;
        tracing::info!(intent_id = %intent.id, amount = amount_minor_units, "payment intent created");

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
