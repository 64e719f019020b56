use storefront_checkout_api::dto::cart::CartItemInput;
use storefront_checkout_api::services::cart_service::collapse_items;
use uuid::Uuid;

fn item(variant: Uuid, size: &str, quantity: i32) -> CartItemInput {
    CartItemInput {
        product_variant_id: variant,
        selected_size: size.into(),
        quantity,
    }
}

#[test]
fn sums_duplicate_variant_size_pairs() {
    let v = Uuid::new_v4();
    let collapsed = collapse_items(vec![item(v, "M", 1), item(v, "M", 2), item(v, "M", 1)]);

    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed[0].quantity, 4);
}

#[test]
fn same_variant_different_sizes_stay_separate() {
    let v = Uuid::new_v4();
    let collapsed = collapse_items(vec![item(v, "M", 1), item(v, "L", 2)]);

    assert_eq!(collapsed.len(), 2);
}

#[test]
fn preserves_first_seen_order() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let collapsed = collapse_items(vec![
        item(b, "M", 1),
        item(a, "M", 1),
        item(c, "M", 1),
        item(b, "M", 5),
    ]);

    let order: Vec<Uuid> = collapsed.iter().map(|i| i.product_variant_id).collect();
    assert_eq!(order, vec![b, a, c]);
    assert_eq!(collapsed[0].quantity, 6);
}

#[test]
fn empty_input_stays_empty() {
    assert!(collapse_items(Vec::new()).is_empty());
}
