use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Orders at or above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = dec!(100.00);
pub const FLAT_SHIPPING_FEE: Decimal = dec!(9.99);
pub const TAX_RATE: Decimal = dec!(0.085);

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Totals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Server-side totals policy. Client-supplied totals are never trusted;
/// every path that needs a total calls this.
pub fn compute_totals<I>(lines: I) -> Totals
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    let subtotal: Decimal = lines
        .into_iter()
        .map(|(price, quantity)| price * Decimal::from(quantity))
        .sum();
    let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    };
    let tax = (subtotal * TAX_RATE).round_dp(2);
    let total = subtotal + shipping + tax;
    Totals {
        subtotal,
        shipping,
        tax,
        total,
    }
}

/// Amount the processor is charged, in minor currency units. Midpoints
/// round away from zero, not to even.
pub fn total_minor_units(total: Decimal) -> AppResult<i64> {
    (total * dec!(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::BadRequest("total out of range".into()))
}
