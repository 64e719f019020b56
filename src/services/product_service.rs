use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::products::{ProductList, ProductWithVariants},
    entity::{
        product_variants::{Column as VariantCol, Entity as ProductVariants, Model as VariantModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Product, ProductVariant},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Description).ilike(pattern)),
        );
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(ProdCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(ProdCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let products = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(products.len());
    for product in products {
        let variants = ProductVariants::find()
            .filter(VariantCol::ProductId.eq(product.id))
            .order_by_asc(VariantCol::CreatedAt)
            .all(&state.orm)
            .await?
            .into_iter()
            .map(variant_from_entity)
            .collect();
        items.push(ProductWithVariants {
            product: product_from_entity(product),
            variants,
        });
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<ProductWithVariants>> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.eq(product.id))
        .order_by_asc(VariantCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(variant_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductWithVariants {
            product: product_from_entity(product),
            variants,
        },
        None,
    ))
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn variant_from_entity(model: VariantModel) -> ProductVariant {
    let sizes = serde_json::from_value(model.sizes).unwrap_or_default();
    ProductVariant {
        id: model.id,
        product_id: model.product_id,
        color: model.color,
        price: model.price,
        stock: model.stock,
        image: model.image,
        sizes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
