use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::units::WeightUnit;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PricingMode {
    /// Flat price at or below the band ceiling.
    Step,
    /// Base price plus a per-unit rate above the band's reference weight.
    Linear,
}

/// A weight band exactly as the rate store holds it. Price maps are keyed by
/// whatever zone spelling was imported; see `freight::rate_table::WeightBand`
/// for the normalized form used at calculation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawWeightBand {
    pub weight: Decimal,
    pub weight_unit: WeightUnit,
    pub mode: PricingMode,
    pub reference_weight: Option<Decimal>,
    pub base_prices: BTreeMap<String, Decimal>,
    pub unit_prices: BTreeMap<String, Decimal>,
}
