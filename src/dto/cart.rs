use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Fetch,
    Sync,
    Merge,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartItemInput {
    pub product_variant_id: Uuid,
    pub selected_size: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartRequest {
    pub action: CartAction,
    #[serde(default)]
    pub items: Vec<CartItemInput>,
}

/// Server cart row denormalized with catalog display data.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub product_variant_id: Uuid,
    pub name: String,
    pub color: String,
    pub selected_size: String,
    pub quantity: i32,
    pub price: Decimal,
    pub image: Option<String>,
    pub stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLine>,
}
