use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::units::{apply_rounding, conversion_factor, Rounding, UnitError};
use super::zone_key::normalize_zone_map;
use crate::domain::money::{round_money, ChargeOverflow};
use crate::domain::product::ProductId;
use crate::domain::rate::{PricingMode, RawWeightBand};
use crate::domain::units::{Unit, WeightUnit};
use crate::domain::zone::ZoneId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RateTableError {
    #[error("product {product_id} has no weight bands configured")]
    NoWeightBand { product_id: ProductId },
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Overflow(#[from] ChargeOverflow),
}

/// A weight band with zone keys normalized and weights expressed in the
/// owning table's unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightBand {
    pub weight: Decimal,
    pub mode: PricingMode,
    /// Weight above which a LINEAR band charges its unit price.
    pub reference_weight: Decimal,
    pub base_prices: BTreeMap<ZoneId, Decimal>,
    pub unit_prices: BTreeMap<ZoneId, Decimal>,
}

/// `(band, zone)` price pair. `configured` is false when the zone has no
/// positive base price in the band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneRate {
    pub base_price: Decimal,
    pub unit_price: Decimal,
    pub configured: bool,
}

impl ZoneRate {
    pub fn not_configured() -> Self {
        Self { base_price: Decimal::ZERO, unit_price: Decimal::ZERO, configured: false }
    }
}

/// Ordered weight bands of one product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateTable {
    product_id: ProductId,
    weight_unit: WeightUnit,
    bands: Vec<WeightBand>,
    dropped_keys: Vec<String>,
}

impl RateTable {
    /// Builds the table in `weight_unit`, normalizing every band's zone keys.
    ///
    /// Bands are sorted ascending by ceiling (stable for equal ceilings). A
    /// LINEAR band without an explicit reference weight charges above the
    /// previous band's ceiling, or above zero for the first band.
    pub fn build(
        product_id: ProductId,
        weight_unit: WeightUnit,
        raw_bands: &[RawWeightBand],
    ) -> Result<Self, RateTableError> {
        let mut converted = Vec::with_capacity(raw_bands.len());
        let mut dropped_keys = Vec::new();

        for raw in raw_bands {
            let from = Unit::from(raw.weight_unit);
            let to = Unit::from(weight_unit);
            let weight_factor = conversion_factor(from, to)?;
            let weight = to_table_weight(raw.weight, weight_factor, from, to);
            let reference_weight =
                raw.reference_weight.map(|value| to_table_weight(value, weight_factor, from, to));

            let base = normalize_zone_map(&raw.base_prices);
            let unit = normalize_zone_map(&raw.unit_prices);
            dropped_keys.extend(base.dropped_keys);
            dropped_keys.extend(unit.dropped_keys);

            // A price per source unit becomes a price per table unit.
            let unit_prices = if from == to {
                unit.values
            } else {
                unit.values.into_iter().map(|(zone, price)| (zone, price / weight_factor)).collect()
            };

            converted.push((weight, raw.mode, reference_weight, base.values, unit_prices));
        }

        converted.sort_by(|left, right| left.0.cmp(&right.0));

        let mut previous_ceiling = Decimal::ZERO;
        let bands = converted
            .into_iter()
            .map(|(weight, mode, reference_weight, base_prices, unit_prices)| {
                let band = WeightBand {
                    weight,
                    mode,
                    reference_weight: reference_weight.unwrap_or(previous_ceiling),
                    base_prices,
                    unit_prices,
                };
                previous_ceiling = weight;
                band
            })
            .collect();

        if !dropped_keys.is_empty() {
            warn!(
                event_name = "freight.rate_table.zone_keys_dropped",
                product_id = %product_id,
                dropped = ?dropped_keys,
                "unrecognized zone keys were dropped while loading weight bands"
            );
        }

        Ok(Self { product_id, weight_unit, bands, dropped_keys })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn weight_unit(&self) -> WeightUnit {
        self.weight_unit
    }

    pub fn bands(&self) -> &[WeightBand] {
        &self.bands
    }

    pub fn dropped_keys(&self) -> &[String] {
        &self.dropped_keys
    }

    /// First band whose ceiling is at least `chargeable_weight`, or the
    /// heaviest band when the weight exceeds every ceiling.
    pub fn find_band(&self, chargeable_weight: Decimal) -> Result<&WeightBand, RateTableError> {
        self.bands
            .iter()
            .find(|band| band.weight >= chargeable_weight)
            .or_else(|| self.bands.last())
            .ok_or_else(|| RateTableError::NoWeightBand { product_id: self.product_id.clone() })
    }

    pub fn price_for(&self, band: &WeightBand, zone: ZoneId) -> ZoneRate {
        match band.base_prices.get(&zone) {
            Some(base_price) if *base_price > Decimal::ZERO => ZoneRate {
                base_price: *base_price,
                unit_price: band
                    .unit_prices
                    .get(&zone)
                    .copied()
                    .filter(|price| *price > Decimal::ZERO)
                    .unwrap_or(Decimal::ZERO),
                configured: true,
            },
            _ => ZoneRate::not_configured(),
        }
    }

    pub fn compute_base_charge(
        &self,
        band: &WeightBand,
        zone: ZoneId,
        chargeable_weight: Decimal,
    ) -> Result<Decimal, ChargeOverflow> {
        let rate = self.price_for(band, zone);
        let amount = match band.mode {
            PricingMode::Step => rate.base_price,
            PricingMode::Linear => {
                let excess = (chargeable_weight - band.reference_weight).max(Decimal::ZERO);
                rate.unit_price
                    .checked_mul(excess)
                    .and_then(|extra| rate.base_price.checked_add(extra))
                    .ok_or(ChargeOverflow)?
            }
        };
        Ok(round_money(amount))
    }
}

fn to_table_weight(value: Decimal, factor: Decimal, from: Unit, to: Unit) -> Decimal {
    if from == to {
        value
    } else {
        apply_rounding(value * factor, Rounding::HalfUp)
    }
}
