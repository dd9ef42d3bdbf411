use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::units::{DimensionUnit, WeightUnit};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A shipping product (carrier service) as held by the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub provider: String,
    pub currency: String,
    pub weight_unit: WeightUnit,
    pub dimension_unit: DimensionUnit,
    /// Volumetric divisor. `None` falls back to the configured default for the
    /// product's dimension system.
    pub dim_factor: Option<Decimal>,
    pub effective_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub active: bool,
}

impl Product {
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        self.active
            && self.effective_date <= date
            && self.expiration_date.map_or(true, |expiration| date <= expiration)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Product, ProductId};
    use crate::domain::units::{DimensionUnit, WeightUnit};

    fn product(active: bool, expiration: Option<NaiveDate>) -> Product {
        Product {
            id: ProductId("ground".to_string()),
            name: "Ground".to_string(),
            provider: "acme".to_string(),
            currency: "USD".to_string(),
            weight_unit: WeightUnit::Lb,
            dimension_unit: DimensionUnit::In,
            dim_factor: None,
            effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"),
            expiration_date: expiration,
            active,
        }
    }

    #[test]
    fn availability_honours_active_flag_and_window() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).expect("date");
        assert!(product(true, None).is_available_on(day));
        assert!(!product(false, None).is_available_on(day));
        assert!(!product(true, NaiveDate::from_ymd_opt(2025, 5, 31)).is_available_on(day));
        assert!(product(true, Some(day)).is_available_on(day));
        assert!(!product(true, None)
            .is_available_on(NaiveDate::from_ymd_opt(2024, 12, 31).expect("date")));
    }
}
