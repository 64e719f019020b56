use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Product, ProductVariant};

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithVariants {
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<ProductWithVariants>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantList {
    pub items: Vec<ProductVariant>,
}
