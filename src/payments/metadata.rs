use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;

use crate::dto::checkout::CheckoutLine;
use crate::error::{AppError, AppResult};
use crate::models::Address;

/// Hard per-value ceiling imposed by the processor.
pub const METADATA_VALUE_CEILING: usize = 500;

/// Encode order items and addresses into processor metadata. Each value is
/// degraded in stages until it fits under the ceiling: full JSON, then a
/// stripped JSON, then a hand-rolled delimited string for the item list. A
/// value that cannot fit even in its most compact form is an error, never a
/// silent truncation.
pub fn encode(
    items: &[CheckoutLine],
    shipping: &Address,
    billing: Option<&Address>,
) -> AppResult<HashMap<String, String>> {
    let mut metadata = HashMap::new();
    metadata.insert("items".to_string(), encode_items(items)?);
    metadata.insert("shipping".to_string(), encode_address(shipping)?);
    if let Some(billing) = billing {
        metadata.insert("billing".to_string(), encode_address(billing)?);
    }
    Ok(metadata)
}

fn encode_items(items: &[CheckoutLine]) -> AppResult<String> {
    let full = to_json(items)?;
    if full.len() <= METADATA_VALUE_CEILING {
        return Ok(full);
    }

    let stripped: Vec<_> = items
        .iter()
        .map(|line| json!({ "v": line.product_variant_id, "q": line.quantity }))
        .collect();
    let stripped = to_json(&stripped)?;
    if stripped.len() <= METADATA_VALUE_CEILING {
        tracing::debug!(len = stripped.len(), "item metadata degraded to stripped json");
        return Ok(stripped);
    }

    let delimited = items
        .iter()
        .map(|line| format!("{}:{}", line.product_variant_id, line.quantity))
        .collect::<Vec<_>>()
        .join(",");
    if delimited.len() <= METADATA_VALUE_CEILING {
        tracing::warn!(len = delimited.len(), "item metadata degraded to delimited form");
        return Ok(delimited);
    }

    Err(AppError::MetadataTooLarge(delimited.len()))
}

fn encode_address(address: &Address) -> AppResult<String> {
    let full = to_json(address)?;
    if full.len() <= METADATA_VALUE_CEILING {
        return Ok(full);
    }

    // Drop the free-form extras, keep the required fields.
    let stripped = to_json(&json!({
        "name": address.name,
        "line1": address.line1,
        "city": address.city,
        "postal_code": address.postal_code,
        "country": address.country,
    }))?;
    if stripped.len() <= METADATA_VALUE_CEILING {
        tracing::warn!(len = stripped.len(), "address metadata degraded to required fields");
        return Ok(stripped);
    }

    Err(AppError::MetadataTooLarge(stripped.len()))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    serde_json::to_string(value).map_err(|err| AppError::Internal(err.into()))
}
