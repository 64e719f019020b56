use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a `t=<unix>,v1=<hex>` signature header: HMAC-SHA256 of
/// `"{t}.{body}"` under the shared webhook secret, with a timestamp
/// tolerance against replays. Returns false on any malformed input.
pub fn verify(payload: &[u8], header: &str, secret: &str, tolerance_secs: i64) -> bool {
    let (mut timestamp, mut signature) = ("", "");
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value,
            Some(("v1", value)) => signature = value,
            _ => {}
        }
    }
    if timestamp.is_empty() || signature.is_empty() {
        return false;
    }

    let Ok(ts) = timestamp.parse::<i64>() else {
        return false;
    };
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > tolerance_secs {
        return false;
    }

    let Ok(expected) = hex::decode(signature) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Test helper mirroring what the processor sends.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
