use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::orders::{
        AdminCreateOrderRequest, AdminOrderLine, OrderList, OrderWithItems,
        UpdateOrderItemRequest, UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        product_variants::{
            ActiveModel as VariantActive, Column as VariantCol, Entity as ProductVariants,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, SortOrder},
    services::order_service::{order_from_entity, order_item_from_entity},
    services::product_service::variant_from_entity,
    state::AppState,
};
use crate::dto::products::VariantList;
use crate::models::ProductVariant;

/// Admin-initiated order. Prices are re-read from the catalog and stock is
/// checked and decremented inside one transaction; any failing line rolls
/// back every decrement.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: AdminCreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("order has no items".into()));
    }
    for line in &payload.items {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
    }

    let shipping_address = payload
        .shipping_address
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|err| AppError::Internal(err.into()))?;
    let billing_address = payload
        .billing_address
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|err| AppError::Internal(err.into()))?;

    // Duplicate lines are combined up front so the stock check sees the
    // quantity the order actually takes from each variant.
    let mut lines: Vec<AdminOrderLine> = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        match lines.iter_mut().find(|existing| {
            existing.product_variant_id == line.product_variant_id
                && existing.selected_size == line.selected_size
        }) {
            Some(existing) => existing.quantity += line.quantity,
            None => lines.push(line.clone()),
        }
    }
    let mut required: Vec<(Uuid, i32)> = Vec::with_capacity(lines.len());
    for line in &lines {
        match required
            .iter_mut()
            .find(|(id, _)| *id == line.product_variant_id)
        {
            Some((_, quantity)) => *quantity += line.quantity,
            None => required.push((line.product_variant_id, line.quantity)),
        }
    }

    let txn = state.orm.begin().await?;

    let mut prices: Vec<(Uuid, Decimal)> = Vec::with_capacity(required.len());
    for (variant_id, quantity) in &required {
        let variant = ProductVariants::find_by_id(*variant_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let variant = match variant {
            Some(v) => v,
            None => return Err(AppError::UnknownVariants(vec![*variant_id])),
        };
        if variant.stock < *quantity {
            return Err(AppError::InsufficientStock(variant.id));
        }
        prices.push((variant.id, variant.price));
    }

    let mut total = Decimal::ZERO;
    let mut staged: Vec<(Uuid, String, i32, Decimal)> = Vec::with_capacity(lines.len());
    for line in &lines {
        let price = prices
            .iter()
            .find(|(id, _)| *id == line.product_variant_id)
            .map(|(_, price)| *price)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("variant vanished mid-order")))?;
        total += price * Decimal::from(line.quantity);
        staged.push((
            line.product_variant_id,
            line.selected_size.clone(),
            line.quantity,
            price,
        ));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        guest_email: Set(payload.guest_email.clone()),
        status: Set(OrderStatus::Pending.as_str().into()),
        total: Set(total),
        shipping_address: Set(shipping_address),
        billing_address: Set(billing_address),
        payment_intent_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(staged.len());
    for (variant_id, selected_size, quantity, price) in staged {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_variant_id: Set(variant_id),
            selected_size: Set(selected_size),
            quantity: Set(quantity),
            price: Set(price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    for (variant_id, quantity) in &required {
        ProductVariants::update_many()
            .col_expr(
                VariantCol::Stock,
                Expr::col(VariantCol::Stock).sub(*quantity),
            )
            .filter(VariantCol::Id.eq(*variant_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    audit_admin(state, user, AuditAction::AdminOrderCreate, &order.id).await;

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Order found",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::BadRequest("Invalid order status".into()))?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(status.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit_admin(state, user, AuditAction::OrderStatusUpdate, &order.id).await;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Edit one line of an order: quantity 0 removes it. The order total is
/// recomputed from the surviving items in the same transaction, so the
/// total/items invariant holds at commit.
pub async fn update_order_item(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    item_id: Uuid,
    payload: UpdateOrderItemRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    if payload.quantity < 0 {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let item = OrderItems::find_by_id(item_id)
        .filter(OrderItemCol::OrderId.eq(order.id))
        .one(&txn)
        .await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    if payload.quantity == 0 {
        OrderItems::delete_by_id(item.id).exec(&txn).await?;
    } else {
        let mut active: OrderItemActive = item.into();
        active.quantity = Set(payload.quantity);
        active.update(&txn).await?;
    }

    let remaining = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    let total: Decimal = remaining
        .iter()
        .map(|i| i.price * Decimal::from(i.quantity))
        .sum();

    let mut active: OrderActive = order.into();
    active.total = Set(total);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit_admin(state, user, AuditAction::OrderItemUpdate, &order.id).await;

    Ok(ApiResponse::success(
        "Order updated",
        OrderWithItems {
            order: order_from_entity(order),
            items: remaining.into_iter().map(order_item_from_entity).collect(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<VariantList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = ProductVariants::find()
        .filter(VariantCol::Stock.lte(threshold))
        .order_by_asc(VariantCol::Stock)
        .order_by_desc(VariantCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(variant_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Low stock",
        VariantList { items },
        Some(meta),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    delta: i32,
) -> AppResult<ApiResponse<ProductVariant>> {
    ensure_admin(user)?;
    if delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let variant = ProductVariants::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let variant = match variant {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };

    let new_stock = variant.stock + delta;
    if new_stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    let mut active: VariantActive = variant.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit_admin(state, user, AuditAction::InventoryAdjust, &updated.id).await;

    Ok(ApiResponse::success(
        "Inventory updated",
        variant_from_entity(updated),
        Some(Meta::empty()),
    ))
}

async fn audit_admin(state: &AppState, user: &AuthUser, action: AuditAction, resource_id: &Uuid) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some(serde_json::json!({ "id": resource_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
