use crate::{
    audit::{AuditAction, log_audit},
    dto::checkout::{CheckoutLine, PaymentIntentRequest, PaymentIntentResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    payments::metadata,
    pricing,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Compute totals server-side and register a payment intent with the
/// processor. The client-supplied prices feed the subtotal, but the amount
/// charged is always the server's own arithmetic.
pub async fn create_payment_intent(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: PaymentIntentRequest,
) -> AppResult<ApiResponse<PaymentIntentResponse>> {
    validate_lines(&payload.items)?;

    let totals = pricing::compute_totals(
        payload
            .items
            .iter()
            .map(|line| (line.price, line.quantity)),
    );
    let amount = pricing::total_minor_units(totals.total)?;

    let meta = metadata::encode(
        &payload.items,
        &payload.shipping_address,
        payload.billing_address.as_ref(),
    )?;

    let intent = state
        .payments
        .create_payment_intent(amount, &state.currency, &meta)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        user.map(|u| u.user_id),
        AuditAction::PaymentIntentCreate,
        Some(serde_json::json!({ "payment_intent_id": intent.id, "amount": amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment intent created",
        PaymentIntentResponse {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            totals,
        },
        Some(Meta::empty()),
    ))
}

pub fn validate_lines(items: &[CheckoutLine]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    for line in items {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
        if line.price.is_sign_negative() {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }
    }
    Ok(())
}
