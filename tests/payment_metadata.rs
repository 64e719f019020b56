use rust_decimal_macros::dec;
use storefront_checkout_api::dto::checkout::CheckoutLine;
use storefront_checkout_api::error::AppError;
use storefront_checkout_api::models::Address;
use storefront_checkout_api::payments::metadata::{self, METADATA_VALUE_CEILING};
use uuid::Uuid;

fn lines(count: usize) -> Vec<CheckoutLine> {
    (0..count)
        .map(|_| CheckoutLine {
            product_variant_id: Uuid::new_v4(),
            selected_size: "M".into(),
            quantity: 1,
            price: dec!(50.00),
        })
        .collect()
}

fn address() -> Address {
    Address {
        name: "Ada Lovelace".into(),
        line1: "12 Analytical Way".into(),
        line2: None,
        city: "London".into(),
        postal_code: "SW1A 1AA".into(),
        country: "GB".into(),
        extra: serde_json::Map::new(),
    }
}

#[test]
fn small_cart_keeps_full_json() {
    let meta = metadata::encode(&lines(2), &address(), None).unwrap();

    let items = &meta["items"];
    assert!(items.len() <= METADATA_VALUE_CEILING);
    assert!(items.contains("price"), "full form keeps prices: {items}");
    serde_json::from_str::<serde_json::Value>(items).expect("full form is json");

    assert!(meta["shipping"].contains("Ada Lovelace"));
    assert!(!meta.contains_key("billing"));
}

#[test]
fn billing_address_encoded_when_present() {
    let meta = metadata::encode(&lines(1), &address(), Some(&address())).unwrap();
    assert!(meta.contains_key("billing"));
}

#[test]
fn medium_cart_degrades_to_stripped_json() {
    let meta = metadata::encode(&lines(8), &address(), None).unwrap();

    let items = &meta["items"];
    assert!(items.len() <= METADATA_VALUE_CEILING);
    assert!(!items.contains("price"), "stripped form drops prices");
    assert!(items.contains("\"v\""), "stripped form keeps variant ids");
    serde_json::from_str::<serde_json::Value>(items).expect("stripped form is json");
}

#[test]
fn large_cart_degrades_to_delimited_form() {
    let meta = metadata::encode(&lines(10), &address(), None).unwrap();

    let items = &meta["items"];
    assert!(items.len() <= METADATA_VALUE_CEILING);
    assert!(!items.starts_with('['), "delimited form is not json");
    assert_eq!(items.matches(':').count(), 10);
    assert_eq!(items.matches(',').count(), 9);
}

#[test]
fn oversized_cart_is_rejected_not_truncated() {
    let err = metadata::encode(&lines(20), &address(), None).unwrap_err();
    assert!(matches!(err, AppError::MetadataTooLarge(_)), "got {err:?}");
}

#[test]
fn oversized_address_drops_extras() {
    let mut shipping = address();
    shipping
        .extra
        .insert("notes".into(), serde_json::json!("x".repeat(600)));

    let meta = metadata::encode(&lines(1), &shipping, None).unwrap();
    let encoded = &meta["shipping"];
    assert!(encoded.len() <= METADATA_VALUE_CEILING);
    assert!(!encoded.contains("notes"), "extras are dropped, not truncated");
    assert!(encoded.contains("Ada Lovelace"));
}

#[test]
fn address_too_large_even_stripped_is_rejected() {
    let mut shipping = address();
    shipping.postal_code = "9".repeat(600);

    let err = metadata::encode(&lines(1), &shipping, None).unwrap_err();
    assert!(matches!(err, AppError::MetadataTooLarge(_)), "got {err:?}");
}
