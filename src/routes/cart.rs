use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::cart::{CartAction, CartList, CartRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(cart_action))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = CartRequest,
    responses(
        (status = 200, description = "Resulting server cart, denormalized", body = ApiResponse<CartList>),
        (status = 400, description = "Bad request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_action(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CartRequest>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = match payload.action {
        CartAction::Fetch => cart_service::fetch(&state, &user).await,
        CartAction::Sync => cart_service::sync(&state, &user, payload.items).await?,
        CartAction::Merge => cart_service::merge(&state, &user, payload.items).await?,
    };
    Ok(Json(resp))
}
