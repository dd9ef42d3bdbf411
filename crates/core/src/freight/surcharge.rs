use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use super::condition::Condition;
use super::zone_key::normalize_zone_map;
use crate::domain::money::round_money;
use crate::domain::package::PackageAttributes;
use crate::domain::surcharge::{
    DimensionCategory, SeasonalSurcharge, Surcharge, SurchargeLine, SurchargeSource,
};
use crate::domain::zone::ZoneId;

/// Fee keys that apply to every zone without a zone-specific entry.
const DEFAULT_FEE_KEYS: &[&str] = &["default", "all", "any", "*"];

/// A flat surcharge with its condition parsed and fee keys normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSurcharge {
    pub surcharge: Surcharge,
    pub condition: Condition,
    pub category: DimensionCategory,
    pub fees: BTreeMap<ZoneId, Decimal>,
    pub default_fee: Option<Decimal>,
}

impl PreparedSurcharge {
    pub fn fee_for(&self, zone: ZoneId) -> Decimal {
        self.fees.get(&zone).copied().or(self.default_fee).unwrap_or(Decimal::ZERO)
    }
}

/// A surcharge left out of the catalog because its condition did not parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedSurcharge {
    pub surcharge_id: String,
    pub condition: String,
    pub message: String,
}

/// All surcharges of one product, ready for evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurchargeCatalog {
    pub flat: Vec<PreparedSurcharge>,
    pub seasonal: Vec<SeasonalSurcharge>,
    pub rejected: Vec<RejectedSurcharge>,
}

impl SurchargeCatalog {
    pub fn prepare(surcharges: &[Surcharge], seasonal: Vec<SeasonalSurcharge>) -> Self {
        let mut catalog = Self { seasonal, ..Self::default() };

        for surcharge in surcharges {
            let condition = match Condition::parse(&surcharge.condition) {
                Ok(condition) => condition,
                Err(error) => {
                    warn!(
                        event_name = "freight.surcharge.invalid_condition",
                        surcharge_id = %surcharge.id,
                        condition = %surcharge.condition,
                        error = %error,
                        "surcharge condition could not be parsed; surcharge skipped"
                    );
                    catalog.rejected.push(RejectedSurcharge {
                        surcharge_id: surcharge.id.clone(),
                        condition: surcharge.condition.clone(),
                        message: error.to_string(),
                    });
                    continue;
                }
            };

            let (default_entries, zoned): (BTreeMap<_, _>, BTreeMap<_, _>) =
                surcharge.fees.iter().map(|(key, fee)| (key.clone(), *fee)).partition(|(key, _)| {
                    DEFAULT_FEE_KEYS.contains(&key.trim().to_ascii_lowercase().as_str())
                });
            let normalized = normalize_zone_map(&zoned);

            catalog.flat.push(PreparedSurcharge {
                category: condition.category(),
                condition,
                fees: normalized.values,
                default_fee: default_entries.values().next().copied(),
                surcharge: surcharge.clone(),
            });
        }

        catalog
    }
}

#[derive(Clone, Debug)]
struct Candidate<'a> {
    prepared: &'a PreparedSurcharge,
    amount: Decimal,
}

/// Evaluates, collapses and prices the surcharges applicable to a package.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurchargeEngine;

impl SurchargeEngine {
    /// Returns flat lines (ordered by display order) followed by seasonal
    /// lines.
    ///
    /// Flat candidates that match and carry a positive fee at `zone` are
    /// collapsed twice: per surcharge type (the unauthorized type excepted,
    /// so its sub-types co-occur), then per dimension category (all
    /// categories but `None`). Each collapse keeps the highest amount, and
    /// the earliest candidate on ties.
    pub fn evaluate(
        &self,
        catalog: &SurchargeCatalog,
        attributes: &PackageAttributes,
        zone: ZoneId,
        date: NaiveDate,
    ) -> Vec<SurchargeLine> {
        let candidates: Vec<Candidate<'_>> = catalog
            .flat
            .iter()
            .filter(|prepared| prepared.condition.matches(attributes))
            .map(|prepared| Candidate { prepared, amount: round_money(prepared.fee_for(zone)) })
            .filter(|candidate| candidate.amount > Decimal::ZERO)
            .collect();

        let per_type = collapse_by(candidates, |candidate| {
            let surcharge = &candidate.prepared.surcharge;
            (!surcharge.is_unauthorized()).then(|| surcharge.surcharge_type.to_ascii_uppercase())
        });
        let mut survivors = collapse_by(per_type, |candidate| {
            let category = candidate.prepared.category;
            (category != DimensionCategory::None).then_some(category)
        });
        survivors.sort_by_key(|candidate| candidate.prepared.surcharge.display_order);

        let mut lines: Vec<SurchargeLine> = survivors
            .into_iter()
            .map(|candidate| {
                let surcharge = &candidate.prepared.surcharge;
                SurchargeLine {
                    surcharge_type: surcharge.surcharge_type.clone(),
                    sub_type: surcharge.sub_type.clone(),
                    name: surcharge.name.clone(),
                    amount: candidate.amount,
                    condition: candidate.prepared.condition.text().to_string(),
                    category: candidate.prepared.category,
                    source: SurchargeSource::Flat,
                }
            })
            .collect();

        lines.extend(catalog.seasonal.iter().filter(|seasonal| seasonal.applies_on(date)).map(
            |seasonal| SurchargeLine {
                surcharge_type: seasonal.surcharge_type.clone(),
                sub_type: None,
                name: seasonal.name.clone(),
                amount: round_money(seasonal.fee),
                condition: format!("{} to {}", seasonal.start_date, seasonal.end_date),
                category: DimensionCategory::None,
                source: SurchargeSource::Seasonal,
            },
        ));

        lines
    }
}

/// Keeps the highest-amount candidate per key, leaving unkeyed candidates
/// untouched. Input order is preserved and the first candidate wins ties.
fn collapse_by<'a, K, F>(candidates: Vec<Candidate<'a>>, key: F) -> Vec<Candidate<'a>>
where
    K: Ord,
    F: Fn(&Candidate<'a>) -> Option<K>,
{
    let mut winners: BTreeMap<K, usize> = BTreeMap::new();
    for (index, candidate) in candidates.iter().enumerate() {
        if let Some(group) = key(candidate) {
            match winners.get(&group) {
                Some(&best) if candidates[best].amount >= candidate.amount => {}
                _ => {
                    winners.insert(group, index);
                }
            }
        }
    }

    candidates
        .into_iter()
        .enumerate()
        .filter(|(index, candidate)| {
            key(candidate).map_or(true, |group| winners.get(&group) == Some(index))
        })
        .map(|(_, candidate)| candidate)
        .collect()
}
