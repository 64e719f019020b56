use axum::extract::Query;
use axum::http::Uri;
use storefront_checkout_api::routes::params::{
    LowStockQuery, OrderListQuery, ProductQuery, SortOrder,
};

#[test]
fn numeric_pagination_parses_from_query_string() {
    let uri: Uri = "/api/orders?page=2&per_page=10&status=paid".parse().unwrap();
    let Query(query) = Query::<OrderListQuery>::try_from_uri(&uri).unwrap();

    assert_eq!(query.page, Some(2));
    assert_eq!(query.per_page, Some(10));
    assert_eq!(query.status.as_deref(), Some("paid"));

    let (page, per_page, offset) = query.pagination().normalize();
    assert_eq!((page, per_page, offset), (2, 10, 10));
}

#[test]
fn product_query_parses_search_and_sort() {
    let uri: Uri = "/api/products?page=3&q=tee&sort_order=asc".parse().unwrap();
    let Query(query) = Query::<ProductQuery>::try_from_uri(&uri).unwrap();

    assert_eq!(query.page, Some(3));
    assert_eq!(query.q.as_deref(), Some("tee"));
    assert!(matches!(query.sort_order, Some(SortOrder::Asc)));
}

#[test]
fn low_stock_query_parses_threshold() {
    let uri: Uri = "/api/admin/inventory/low-stock?threshold=3&per_page=5"
        .parse()
        .unwrap();
    let Query(query) = Query::<LowStockQuery>::try_from_uri(&uri).unwrap();

    assert_eq!(query.threshold, Some(3));
    assert_eq!(query.per_page, Some(5));
}

#[test]
fn missing_params_fall_back_to_defaults() {
    let uri: Uri = "/api/orders".parse().unwrap();
    let Query(query) = Query::<OrderListQuery>::try_from_uri(&uri).unwrap();

    let (page, per_page, offset) = query.pagination().normalize();
    assert_eq!((page, per_page, offset), (1, 20, 0));
}

#[test]
fn normalize_clamps_out_of_range_values() {
    let uri: Uri = "/api/orders?page=0&per_page=1000".parse().unwrap();
    let Query(query) = Query::<OrderListQuery>::try_from_uri(&uri).unwrap();

    let (page, per_page, _) = query.pagination().normalize();
    assert_eq!((page, per_page), (1, 100));
}
