use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Everything this API records in the audit trail. Each action knows the
/// table it acts on, so callers cannot mislabel the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    CartSync,
    CartMerge,
    PaymentIntentCreate,
    OrderCreate,
    OrderPaid,
    AdminOrderCreate,
    OrderStatusUpdate,
    OrderItemUpdate,
    InventoryAdjust,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CartSync => "cart_sync",
            AuditAction::CartMerge => "cart_merge",
            AuditAction::PaymentIntentCreate => "payment_intent_create",
            AuditAction::OrderCreate => "order_create",
            AuditAction::OrderPaid => "order_paid",
            AuditAction::AdminOrderCreate => "admin_order_create",
            AuditAction::OrderStatusUpdate => "order_status_update",
            AuditAction::OrderItemUpdate => "order_item_update",
            AuditAction::InventoryAdjust => "inventory_adjust",
        }
    }

    pub fn resource(&self) -> &'static str {
        match self {
            AuditAction::CartSync | AuditAction::CartMerge => "cart_items",
            AuditAction::InventoryAdjust => "product_variants",
            _ => "orders",
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
