use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    audit::{AuditAction, log_audit},
    dto::checkout::WebhookEvent,
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    models::OrderStatus,
    payments::signature,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Entry point for processor callbacks. Verification fails closed: nothing
/// is touched unless the signature checks out against the shared secret.
pub async fn handle_event(
    state: &AppState,
    payload: &[u8],
    signature_header: Option<&str>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let header = signature_header.ok_or(AppError::InvalidSignature)?;
    if !signature::verify(
        payload,
        header,
        &state.webhook_secret,
        state.webhook_tolerance_secs,
    ) {
        return Err(AppError::InvalidSignature);
    }

    let event: WebhookEvent = serde_json::from_slice(payload)
        .map_err(|_| AppError::BadRequest("invalid webhook payload".into()))?;

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            mark_order_paid(state, &event.data.object.id).await?;
        }
        other => {
            tracing::info!(event_type = other, "ignoring webhook event");
        }
    }

    Ok(ApiResponse::success(
        "Ok",
        serde_json::json!({ "received": true }),
        Some(Meta::empty()),
    ))
}

/// Transition the matching order pending -> paid. The webhook can outrun the
/// order-creation commit, so the lookup runs under the injected retry policy;
/// exhaustion reports not-found and the processor redelivers later. The
/// update filters on the pending status, so a duplicate delivery matches zero
/// rows and is a no-op.
async fn mark_order_paid(state: &AppState, payment_intent_id: &str) -> AppResult<()> {
    let order = state
        .retry
        .run(|| async {
            Orders::find()
                .filter(OrderCol::PaymentIntentId.eq(payment_intent_id))
                .one(&state.orm)
                .await
                .map_err(AppError::from)
        })
        .await?;

    let Some(order) = order else {
        tracing::warn!(payment_intent_id, "no order found for payment intent");
        return Err(AppError::OrderNotFoundForIntent(payment_intent_id.into()));
    };

    let result = Orders::update_many()
        .col_expr(
            OrderCol::Status,
            Expr::value(OrderStatus::Paid.as_str()),
        )
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        tracing::info!(order_id = %order.id, "order already paid, duplicate delivery");
    } else {
        tracing::info!(order_id = %order.id, "order marked paid");
    }

    if let Err(err) = log_audit(
        &state.pool,
        order.user_id,
        AuditAction::OrderPaid,
        Some(serde_json::json!({
            "order_id": order.id,
            "payment_intent_id": payment_intent_id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}
