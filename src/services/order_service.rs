use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    dto::checkout::CreateOrderRequest,
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        product_variants::{Column as VariantCol, Entity as ProductVariants},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::checkout_service,
    state::AppState,
};

/// Customer checkout path: persists the order as `pending` once the payer's
/// browser has confirmed the intent. Stock is not decremented here; that
/// belongs to fulfillment.
pub async fn create_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    checkout_service::validate_lines(&payload.items)?;
    if payload.payment_intent_id.is_empty() {
        return Err(AppError::BadRequest("payment_intent_id is required".into()));
    }
    let user_id = user.map(|u| u.user_id);
    if user_id.is_none() && payload.guest_email.as_deref().unwrap_or("").is_empty() {
        return Err(AppError::BadRequest(
            "guest_email is required for guest checkout".into(),
        ));
    }

    // All-or-nothing: unknown variants reject the whole request before any write.
    let mut ids: Vec<Uuid> = payload
        .items
        .iter()
        .map(|line| line.product_variant_id)
        .collect();
    ids.sort();
    ids.dedup();
    let known: Vec<Uuid> = ProductVariants::find()
        .select_only()
        .column(VariantCol::Id)
        .filter(VariantCol::Id.is_in(ids.clone()))
        .into_tuple()
        .all(&state.orm)
        .await?;
    let missing: Vec<Uuid> = ids.into_iter().filter(|id| !known.contains(id)).collect();
    if !missing.is_empty() {
        return Err(AppError::UnknownVariants(missing));
    }

    let totals = pricing::compute_totals(
        payload
            .items
            .iter()
            .map(|line| (line.price, line.quantity)),
    );

    let shipping_address = serde_json::to_value(&payload.shipping_address)
        .map_err(|err| AppError::Internal(err.into()))?;
    let billing_address = payload
        .billing_address
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|err| AppError::Internal(err.into()))?;

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        guest_email: Set(payload.guest_email.clone()),
        status: Set(OrderStatus::Pending.as_str().into()),
        total: Set(totals.total),
        shipping_address: Set(Some(shipping_address)),
        billing_address: Set(billing_address),
        payment_intent_id: Set(Some(payload.payment_intent_id.clone())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_variant_id: Set(line.product_variant_id),
            selected_size: Set(line.selected_size.clone()),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        user_id,
        AuditAction::OrderCreate,
        Some(serde_json::json!({
            "order_id": order.id,
            "payment_intent_id": payload.payment_intent_id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
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
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
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
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        guest_email: model.guest_email,
        status: model.status,
        total: model.total,
        shipping_address: model.shipping_address,
        billing_address: model.billing_address,
        payment_intent_id: model.payment_intent_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_variant_id: model.product_variant_id,
        selected_size: model.selected_size,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
