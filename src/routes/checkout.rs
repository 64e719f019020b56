use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CreateOrderRequest, PaymentIntentRequest, PaymentIntentResponse},
    dto::orders::OrderWithItems,
    error::AppResult,
    middleware::auth::MaybeUser,
    response::ApiResponse,
    services::{checkout_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payment-intent", post(create_payment_intent))
        .route("/order", post(create_order))
}

#[utoipa::path(
    post,
    path = "/api/checkout/payment-intent",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Intent registered with the processor", body = ApiResponse<PaymentIntentResponse>),
        (status = 400, description = "Empty cart or metadata too large"),
        (status = 502, description = "Payment processor unreachable"),
    ),
    tag = "Checkout"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(payload): Json<PaymentIntentRequest>,
) -> AppResult<Json<ApiResponse<PaymentIntentResponse>>> {
    let resp = checkout_service::create_payment_intent(&state, user.as_ref(), payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/order",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order persisted as pending", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Validation failed or unknown variants"),
    ),
    tag = "Checkout"
)]
pub async fn create_order(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::create_order(&state, user.as_ref(), payload).await?;
    Ok(Json(resp))
}
