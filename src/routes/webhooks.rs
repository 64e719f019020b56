use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    error::AppResult, response::ApiResponse, services::webhook_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/payment", post(payment_webhook))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/payment",
    request_body = String,
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Invalid signature or payload"),
        (status = 404, description = "No order for the payment intent yet; processor should redeliver"),
    ),
    tag = "Webhooks"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok());
    let resp = webhook_service::handle_event(&state, &body, signature).await?;
    Ok(Json(resp))
}
