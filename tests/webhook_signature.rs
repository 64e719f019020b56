use chrono::Utc;
use storefront_checkout_api::payments::signature::{sign, verify};

const SECRET: &str = "whsec_test_secret";
const PAYLOAD: &[u8] = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;

#[test]
fn accepts_valid_signature() {
    let header = sign(PAYLOAD, SECRET, Utc::now().timestamp());
    assert!(verify(PAYLOAD, &header, SECRET, 300));
}

#[test]
fn rejects_wrong_secret() {
    let header = sign(PAYLOAD, "whsec_other", Utc::now().timestamp());
    assert!(!verify(PAYLOAD, &header, SECRET, 300));
}

#[test]
fn rejects_modified_payload() {
    let header = sign(PAYLOAD, SECRET, Utc::now().timestamp());
    let tampered = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_2"}}}"#;
    assert!(!verify(tampered, &header, SECRET, 300));
}

#[test]
fn rejects_stale_timestamp() {
    let header = sign(PAYLOAD, SECRET, Utc::now().timestamp() - 3600);
    assert!(!verify(PAYLOAD, &header, SECRET, 300));
}

#[test]
fn rejects_future_timestamp_outside_tolerance() {
    let header = sign(PAYLOAD, SECRET, Utc::now().timestamp() + 3600);
    assert!(!verify(PAYLOAD, &header, SECRET, 300));
}

#[test]
fn rejects_malformed_headers() {
    assert!(!verify(PAYLOAD, "", SECRET, 300));
    assert!(!verify(PAYLOAD, "t=123", SECRET, 300));
    assert!(!verify(PAYLOAD, "v1=deadbeef", SECRET, 300));
    assert!(!verify(PAYLOAD, "t=notanumber,v1=deadbeef", SECRET, 300));

    let ts = Utc::now().timestamp();
    assert!(!verify(PAYLOAD, &format!("t={ts},v1=nothex"), SECRET, 300));
}

#[test]
fn ignores_unknown_header_parts() {
    let header = sign(PAYLOAD, SECRET, Utc::now().timestamp());
    let header = format!("{header},v0=legacy");
    assert!(verify(PAYLOAD, &header, SECRET, 300));
}
