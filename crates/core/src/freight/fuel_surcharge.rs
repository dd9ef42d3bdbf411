use rust_decimal::Decimal;

use crate::domain::money::{round_money, zero_money, ChargeOverflow};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuelSurchargeResult {
    pub rate_pct: Decimal,
    pub amount: Decimal,
}

/// Percentage fuel add-on over the base charge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FuelSurchargeCalculator {
    minimum_fee: Option<Decimal>,
}

impl FuelSurchargeCalculator {
    pub fn new(minimum_fee: Option<Decimal>) -> Self {
        Self { minimum_fee }
    }

    /// A non-positive base always yields a zero surcharge; this check runs
    /// first and the minimum fee can never override it. Otherwise a positive
    /// amount below the minimum fee is raised to it.
    pub fn calculate(
        &self,
        base_amount: Decimal,
        rate_pct: Decimal,
    ) -> Result<FuelSurchargeResult, ChargeOverflow> {
        if base_amount <= Decimal::ZERO {
            return Ok(FuelSurchargeResult { rate_pct, amount: zero_money() });
        }

        let amount = base_amount.checked_mul(rate_pct).ok_or(ChargeOverflow)? / Decimal::ONE_HUNDRED;
        let mut amount = round_money(amount);
        if let Some(minimum) = self.minimum_fee {
            if amount > Decimal::ZERO && amount < minimum {
                amount = round_money(minimum);
            }
        }

        Ok(FuelSurchargeResult { rate_pct, amount })
    }
}
