use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Address;
use crate::pricing::Totals;

/// Finalized cart line as submitted by the client at checkout. The unit
/// price here is a display snapshot; totals are recomputed server-side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutLine {
    pub product_variant_id: Uuid,
    pub selected_size: String,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentIntentRequest {
    pub items: Vec<CheckoutLine>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<CheckoutLine>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_intent_id: String,
    pub guest_email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookEventData {
    pub object: WebhookObject,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookObject {
    pub id: String,
}
