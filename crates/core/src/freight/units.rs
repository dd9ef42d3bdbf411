use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::domain::units::Unit;

/// Kilograms per pound.
pub const KG_PER_LB: Decimal = Decimal::from_parts(453_592, 0, 0, false, 6);
/// Centimetres per inch.
pub const CM_PER_IN: Decimal = Decimal::from_parts(254, 0, 0, false, 2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// Round up to the next whole unit. Used for every value that feeds billing.
    Ceiling,
    /// Two decimal places, midpoint away from zero.
    HalfUp,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("cannot convert {from} to {to}")]
    UnsupportedUnit { from: Unit, to: Unit },
    #[error("{value} {from} is too large to express in {to}")]
    Overflow { value: Decimal, from: Unit, to: Unit },
}

/// Converts `value` between units of the same kind.
///
/// Converting a unit to itself returns the value untouched; rounding only
/// applies when a physical constant was involved.
pub fn convert(value: Decimal, from: Unit, to: Unit, rounding: Rounding) -> Result<Decimal, UnitError> {
    if from == to {
        return Ok(value);
    }

    let converted = match (from, to) {
        (Unit::Lb, Unit::Kg) => value.checked_mul(KG_PER_LB),
        (Unit::Kg, Unit::Lb) => value.checked_div(KG_PER_LB),
        (Unit::In, Unit::Cm) => value.checked_mul(CM_PER_IN),
        (Unit::Cm, Unit::In) => value.checked_div(CM_PER_IN),
        _ => return Err(UnitError::UnsupportedUnit { from, to }),
    };

    converted
        .map(|converted| apply_rounding(converted, rounding))
        .ok_or(UnitError::Overflow { value, from, to })
}

/// How many `to` units make up one `from` unit, unrounded.
pub fn conversion_factor(from: Unit, to: Unit) -> Result<Decimal, UnitError> {
    match (from, to) {
        _ if from == to => Ok(Decimal::ONE),
        (Unit::Lb, Unit::Kg) => Ok(KG_PER_LB),
        (Unit::Kg, Unit::Lb) => Ok(Decimal::ONE / KG_PER_LB),
        (Unit::In, Unit::Cm) => Ok(CM_PER_IN),
        (Unit::Cm, Unit::In) => Ok(Decimal::ONE / CM_PER_IN),
        _ => Err(UnitError::UnsupportedUnit { from, to }),
    }
}

pub fn apply_rounding(value: Decimal, rounding: Rounding) -> Decimal {
    match rounding {
        Rounding::Ceiling => value.ceil(),
        Rounding::HalfUp => value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
    }
}
