use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

pub const MONEY_SCALE: u32 = 2;

/// A charge that no longer fits in a `Decimal`.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("charge exceeds the representable range")]
pub struct ChargeOverflow;

/// Rounds to two decimal places, midpoint away from zero, and pins the scale
/// so the value always renders with exactly two fractional digits.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

pub fn zero_money() -> Decimal {
    round_money(Decimal::ZERO)
}
