use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::ProductId;
use super::surcharge::SurchargeLine;
use super::units::WeightUnit;
use super::zone::ZoneId;

/// A recoverable condition absorbed during pricing. The calculation still
/// produced a best-effort price; these tell the caller what was degraded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Diagnostic {
    RateNotConfigured { zone: ZoneId, band_weight: Decimal },
    ZoneDefaulted { origin: String, destination: String, reason: String },
    FuelRateDefaulted { provider: String, date: NaiveDate },
    PlaceholderApplied { field: String, value: Decimal },
    InvalidSurchargeCondition { surcharge_id: String, condition: String, message: String },
    ZoneKeysDropped { keys: Vec<String> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSource {
    Override,
    Resolved,
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelRateSource {
    Configured,
    Default,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub reasons: Vec<Diagnostic>,
    pub matched_band_weight: Option<Decimal>,
    pub zone_key_used: Option<String>,
    pub zone_source: ZoneSource,
    pub fuel_rate_source: FuelRateSource,
    pub fuel_rate_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedResult {
    pub product_id: ProductId,
    pub calculation_date: NaiveDate,
    pub weight_unit: WeightUnit,
    pub chargeable_weight: Decimal,
    pub volumetric_weight: Decimal,
    pub zone: ZoneId,
    pub base_charge: Decimal,
    pub fuel_rate_pct: Decimal,
    pub fuel_surcharge: Decimal,
    pub surcharges: Vec<SurchargeLine>,
    pub total_charge: Decimal,
    pub currency: String,
    pub unauthorized_reasons: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl PricedResult {
    pub fn is_authorized(&self) -> bool {
        self.unauthorized_reasons.is_empty()
    }

    pub fn surcharge_total(&self) -> Decimal {
        self.surcharges.iter().map(|line| line.amount).sum()
    }

    pub fn has_diagnostic(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.diagnostics.reasons.iter().any(predicate)
    }
}
