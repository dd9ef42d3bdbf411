use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Surcharge type reserved for packages beyond carrier limits. Its sub-types
/// (overweight, overlength, over girth) may all apply at once.
pub const UNAUTHORIZED_TYPE: &str = "UNAUTHORIZED";

/// A flat-fee surcharge as stored. `fees` is keyed by raw zone spellings plus
/// an optional `default` entry that applies to every zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surcharge {
    pub id: String,
    pub surcharge_type: String,
    pub sub_type: Option<String>,
    pub name: String,
    pub condition: String,
    pub fees: BTreeMap<String, Decimal>,
    pub display_order: i32,
}

impl Surcharge {
    pub fn is_unauthorized(&self) -> bool {
        self.surcharge_type.eq_ignore_ascii_case(UNAUTHORIZED_TYPE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalSurcharge {
    pub id: String,
    pub surcharge_type: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub fee: Decimal,
}

impl SeasonalSurcharge {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date && self.fee > Decimal::ZERO
    }
}

/// Physical attribute a surcharge condition is about. At most one surcharge
/// per category other than `None` survives collapsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionCategory {
    Length,
    Width,
    Height,
    Weight,
    LengthGirth,
    Residential,
    Remote,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurchargeSource {
    Flat,
    Seasonal,
}

/// One priced surcharge on the final result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurchargeLine {
    pub surcharge_type: String,
    pub sub_type: Option<String>,
    pub name: String,
    pub amount: Decimal,
    pub condition: String,
    pub category: DimensionCategory,
    pub source: SurchargeSource,
}
