use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, log_audit},
    db::DbPool,
    dto::cart::{CartItemInput, CartLine, CartList},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems},
        product_variants::{Column as VariantCol, Entity as ProductVariants},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CartJoinRow {
    product_variant_id: Uuid,
    selected_size: String,
    quantity: i32,
    name: String,
    color: String,
    price: Decimal,
    image: Option<String>,
    stock: i32,
}

/// Return the user's server cart. Any backend failure degrades to an empty
/// cart so the storefront keeps rendering; the error only reaches the logs.
pub async fn fetch(state: &AppState, user: &AuthUser) -> ApiResponse<CartList> {
    match read_cart(&state.pool, user.user_id).await {
        Ok(items) => ApiResponse::success("OK", CartList { items }, Some(Meta::empty())),
        Err(err) => {
            tracing::warn!(error = %err, user_id = %user.user_id, "cart fetch failed, returning empty cart");
            ApiResponse::success("OK", CartList { items: Vec::new() }, Some(Meta::empty()))
        }
    }
}

/// Replace the server cart with the given items. The client cart is the
/// truth while the user mutates it; last writer wins across devices since
/// no version token is tracked.
pub async fn sync(
    state: &AppState,
    user: &AuthUser,
    items: Vec<CartItemInput>,
) -> AppResult<ApiResponse<CartList>> {
    let items = collapse_items(items);
    validate_items(state, &items).await?;

    let txn = state.orm.begin().await?;
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;
    if !items.is_empty() {
        let rows: Vec<CartItemActive> = items
            .iter()
            .map(|item| CartItemActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_variant_id: Set(item.product_variant_id),
                selected_size: Set(item.selected_size.clone()),
                quantity: Set(item.quantity),
                created_at: NotSet,
            })
            .collect();
        CartItems::insert_many(rows).exec(&txn).await?;
    }
    txn.commit().await?;

    audit_cart(state, user, AuditAction::CartSync, items.len()).await;
    let items = read_cart(&state.pool, user.user_id).await?;
    Ok(ApiResponse::success(
        "Cart replaced",
        CartList { items },
        Some(Meta::empty()),
    ))
}

/// Fold an anonymous cart into the account cart at login: quantities add
/// for matching (variant, size) rows, disjoint rows are inserted.
pub async fn merge(
    state: &AppState,
    user: &AuthUser,
    items: Vec<CartItemInput>,
) -> AppResult<ApiResponse<CartList>> {
    let items = collapse_items(items);
    validate_items(state, &items).await?;

    let txn = state.orm.begin().await?;
    for item in &items {
        let existing = CartItems::find()
            .filter(CartCol::UserId.eq(user.user_id))
            .filter(CartCol::ProductVariantId.eq(item.product_variant_id))
            .filter(CartCol::SelectedSize.eq(item.selected_size.clone()))
            .one(&txn)
            .await?;

        match existing {
            Some(row) => {
                let quantity = row.quantity + item.quantity;
                let mut active: CartItemActive = row.into();
                active.quantity = Set(quantity);
                active.update(&txn).await?;
            }
            None => {
                let active = CartItemActive {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user.user_id),
                    product_variant_id: Set(item.product_variant_id),
                    selected_size: Set(item.selected_size.clone()),
                    quantity: Set(item.quantity),
                    created_at: NotSet,
                };
                active.insert(&txn).await?;
            }
        }
    }
    txn.commit().await?;

    audit_cart(state, user, AuditAction::CartMerge, items.len()).await;
    let items = read_cart(&state.pool, user.user_id).await?;
    Ok(ApiResponse::success(
        "Cart merged",
        CartList { items },
        Some(Meta::empty()),
    ))
}

/// Collapse duplicate (variant, size) keys by summing quantities, keeping
/// first-seen order.
pub fn collapse_items(items: Vec<CartItemInput>) -> Vec<CartItemInput> {
    let mut collapsed: Vec<CartItemInput> = Vec::with_capacity(items.len());
    for item in items {
        match collapsed.iter_mut().find(|existing| {
            existing.product_variant_id == item.product_variant_id
                && existing.selected_size == item.selected_size
        }) {
            Some(existing) => existing.quantity += item.quantity,
            None => collapsed.push(item),
        }
    }
    collapsed
}

async fn validate_items(state: &AppState, items: &[CartItemInput]) -> AppResult<()> {
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".to_string(),
            ));
        }
    }

    let mut ids: Vec<Uuid> = items.iter().map(|item| item.product_variant_id).collect();
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }

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
    Ok(())
}

async fn read_cart(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartJoinRow>(
        r#"
        SELECT ci.product_variant_id, ci.selected_size, ci.quantity,
               p.name, v.color, v.price, v.image, v.stock
        FROM cart_items ci
        JOIN product_variants v ON v.id = ci.product_variant_id
        JOIN products p ON p.id = v.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CartLine {
            product_variant_id: row.product_variant_id,
            name: row.name,
            color: row.color,
            selected_size: row.selected_size,
            quantity: row.quantity,
            price: row.price,
            image: row.image,
            stock: row.stock,
        })
        .collect())
}

async fn audit_cart(state: &AppState, user: &AuthUser, action: AuditAction, item_count: usize) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some(serde_json::json!({ "item_count": item_count })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
