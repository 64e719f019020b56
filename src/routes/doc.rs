use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartItemInput, CartLine, CartList, CartRequest},
        checkout::{
            CheckoutLine, CreateOrderRequest, PaymentIntentRequest, PaymentIntentResponse,
        },
        orders::{
            AdminCreateOrderRequest, AdminOrderLine, OrderList, OrderWithItems,
            UpdateOrderItemRequest, UpdateOrderStatusRequest,
        },
        products::{ProductList, ProductWithVariants, VariantList},
    },
    models::{Address, Order, OrderItem, Product, ProductVariant},
    pricing::Totals,
    response::{ApiResponse, Meta},
    routes::{admin, cart, checkout, health, orders, params, products, webhooks},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        cart::cart_action,
        checkout::create_payment_intent,
        checkout::create_order,
        orders::list_orders,
        orders::get_order,
        admin::create_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::update_order_item,
        admin::list_low_stock,
        admin::adjust_inventory,
        webhooks::payment_webhook
    ),
    components(
        schemas(
            Address,
            Product,
            ProductVariant,
            Order,
            OrderItem,
            Totals,
            CartRequest,
            CartItemInput,
            CartLine,
            CartList,
            CheckoutLine,
            PaymentIntentRequest,
            PaymentIntentResponse,
            CreateOrderRequest,
            AdminCreateOrderRequest,
            AdminOrderLine,
            UpdateOrderStatusRequest,
            UpdateOrderItemRequest,
            OrderList,
            OrderWithItems,
            ProductList,
            ProductWithVariants,
            VariantList,
            admin::InventoryAdjustRequest,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<CartList>,
            ApiResponse<PaymentIntentResponse>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ProductList>,
            ApiResponse<VariantList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog browse endpoints"),
        (name = "Cart", description = "Server cart reconciliation"),
        (name = "Checkout", description = "Payment intent and order creation"),
        (name = "Orders", description = "Customer order history"),
        (name = "Admin", description = "Admin console endpoints"),
        (name = "Webhooks", description = "Payment processor callbacks"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
