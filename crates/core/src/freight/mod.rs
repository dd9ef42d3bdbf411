//! Freight pricing engine: unit handling, rate tables, zone and fuel
//! resolution, surcharges and the orchestrator that sequences them.

pub mod base;
pub mod batch;
pub mod cache;
pub mod calculator;
pub mod condition;
pub mod fuel;
pub mod fuel_surcharge;
pub mod limits;
pub mod rate_table;
pub mod sources;
pub mod surcharge;
pub mod units;
pub mod volumetric;
pub mod zone;
pub mod zone_key;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{run_batch, BatchCancellation, BatchItem, BatchItemOutcome, BatchReport};
pub use cache::{ProductSnapshot, RateCache, ReadThroughCache, SnapshotError};
pub use calculator::{PricingContext, PricingOrchestrator};
pub use fuel::{FuelRateResolution, FuelRateResolver};
pub use limits::PackageLimits;
pub use rate_table::{RateTable, RateTableError, WeightBand};
pub use sources::{
    FreightSources, FuelRateRepository, ProductRepository, RateRepository,
    SeasonalSurchargeRepository, SourceError, SurchargeRepository, ZoneRepository,
};
pub use surcharge::{SurchargeCatalog, SurchargeEngine};
pub use zone::{ZoneResolution, ZoneResolver, ZoneRule, ZoneTable};
