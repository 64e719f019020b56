use storefront_checkout_api::response::{ApiResponse, Meta};

#[test]
fn meta_is_omitted_when_absent() {
    let body = ApiResponse::success("OK", serde_json::json!({ "x": 1 }), None);
    let json = serde_json::to_value(&body).unwrap();
    assert!(json.get("meta").is_none());
}

#[test]
fn pagination_meta_round_trips() {
    let body = ApiResponse::success("OK", serde_json::json!({}), Some(Meta::new(2, 10, 45)));
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["meta"]["page"], 2);
    assert_eq!(json["meta"]["per_page"], 10);
    assert_eq!(json["meta"]["total"], 45);
}

#[test]
fn failure_mirrors_the_message_into_data() {
    let body = ApiResponse::failure("Invalid webhook signature");
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["message"], "Invalid webhook signature");
    assert_eq!(json["data"]["error"], "Invalid webhook signature");
    assert!(json.get("meta").is_none());
}
