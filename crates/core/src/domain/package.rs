use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::units::{DimensionUnit, WeightUnit};

/// Pricing request as received from the API layer. Weight, dimensions and
/// their units may be missing; the orchestrator applies configured
/// placeholders (or rejects the request in strict mode).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRequest {
    pub product_id: String,
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub weight_unit: Option<WeightUnit>,
    #[serde(default)]
    pub length: Option<Decimal>,
    #[serde(default)]
    pub width: Option<Decimal>,
    #[serde(default)]
    pub height: Option<Decimal>,
    #[serde(default)]
    pub dimension_unit: Option<DimensionUnit>,
    #[serde(default)]
    pub origin_postal: String,
    #[serde(default)]
    pub dest_postal: String,
    #[serde(default)]
    pub is_residential: bool,
    #[serde(default)]
    pub remote_area_level: u8,
    #[serde(default)]
    pub calculation_date: Option<NaiveDate>,
    #[serde(default)]
    pub zone_override: Option<String>,
}

/// Validated package expressed in the product's native units. `length` is
/// always the longest side and `height` the shortest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageAttributes {
    pub weight: Decimal,
    pub weight_unit: WeightUnit,
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub dimension_unit: DimensionUnit,
    pub is_residential: bool,
    pub remote_area_level: u8,
}

impl PackageAttributes {
    /// Length plus girth: `length + 2 * (width + height)`.
    pub fn length_girth(&self) -> Decimal {
        self.length + Decimal::TWO * (self.width + self.height)
    }
}

/// Sorts three sides so the first is the longest.
pub fn order_sides(a: Decimal, b: Decimal, c: Decimal) -> (Decimal, Decimal, Decimal) {
    let mut sides = [a, b, c];
    sides.sort_by(|left, right| right.cmp(left));
    (sides[0], sides[1], sides[2])
}
