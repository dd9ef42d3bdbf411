use rust_decimal::Decimal;
use tracing::warn;

use super::rate_table::{RateTable, RateTableError};
use crate::domain::money::{round_money, zero_money};
use crate::domain::result::Diagnostic;
use crate::domain::zone::ZoneId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseChargeResult {
    pub amount: Decimal,
    pub band_weight: Decimal,
    pub zone: ZoneId,
    pub zone_key: String,
    /// Set when the matched band has no positive price for the zone.
    pub diagnostic: Option<Diagnostic>,
}

/// Base freight for a resolved band and zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseFreightCalculator;

impl BaseFreightCalculator {
    /// A missing price degrades to a zero charge with a `RateNotConfigured`
    /// diagnostic. Only a table without bands is an error.
    pub fn calculate(
        &self,
        table: &RateTable,
        chargeable_weight: Decimal,
        zone: ZoneId,
    ) -> Result<BaseChargeResult, RateTableError> {
        let band = table.find_band(chargeable_weight)?;
        let rate = table.price_for(band, zone);

        if !rate.configured {
            warn!(
                event_name = "freight.rate.not_configured",
                product_id = %table.product_id(),
                zone = %zone,
                band_weight = %band.weight,
                "no positive rate configured for zone in matched band"
            );
            return Ok(BaseChargeResult {
                amount: zero_money(),
                band_weight: band.weight,
                zone,
                zone_key: zone.key(),
                diagnostic: Some(Diagnostic::RateNotConfigured { zone, band_weight: band.weight }),
            });
        }

        Ok(BaseChargeResult {
            amount: table.compute_base_charge(band, zone, chargeable_weight)?,
            band_weight: band.weight,
            zone,
            zone_key: zone.key(),
            diagnostic: None,
        })
    }
}
