use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Address, Order, OrderItem};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Admin-initiated order: quantities only, prices come from the catalog.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminOrderLine {
    pub product_variant_id: Uuid,
    pub selected_size: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminCreateOrderRequest {
    pub items: Vec<AdminOrderLine>,
    pub user_id: Option<Uuid>,
    pub guest_email: Option<String>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// Quantity 0 removes the item.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderItemRequest {
    pub quantity: i32,
}
