use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use freightrate_core::domain::fuel::FuelRate;
use freightrate_core::domain::product::{Product, ProductId};
use freightrate_core::domain::rate::RawWeightBand;
use freightrate_core::domain::surcharge::{SeasonalSurcharge, Surcharge};
use freightrate_core::freight::sources::{FreightSources, SourceError};
use freightrate_core::freight::zone::ZoneRule;

use crate::DbPool;

pub mod fuel_rate;
pub mod memory;
pub mod product;
pub mod rate;
pub mod surcharge;
pub mod zone;

pub use fuel_rate::SqlFuelRateRepository;
pub use memory::InMemoryCatalog;
pub use product::SqlProductRepository;
pub use rate::SqlRateRepository;
pub use surcharge::{SqlSeasonalSurchargeRepository, SqlSurchargeRepository};
pub use zone::SqlZoneRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for SourceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) => Self::Unavailable(error.to_string()),
            RepositoryError::Decode(message) => Self::Decode(message),
        }
    }
}

/// Write side of the rate store, used by seeding and imports. The pricing
/// engine never writes.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn save_product(&self, product: Product) -> Result<(), RepositoryError>;

    /// Replaces every weight band of the product.
    async fn replace_bands(
        &self,
        product_id: &ProductId,
        bands: Vec<RawWeightBand>,
    ) -> Result<(), RepositoryError>;

    /// Replaces the whole zone chart. Rule order is kept.
    async fn replace_zone_rules(&self, rules: Vec<ZoneRule>) -> Result<(), RepositoryError>;

    async fn save_fuel_rate(&self, rate: FuelRate) -> Result<(), RepositoryError>;

    async fn save_surcharge(
        &self,
        product_id: &ProductId,
        surcharge: Surcharge,
    ) -> Result<(), RepositoryError>;

    async fn save_seasonal_surcharge(
        &self,
        product_id: &ProductId,
        surcharge: SeasonalSurcharge,
    ) -> Result<(), RepositoryError>;
}

/// SQLite-backed rate store: one repository per collaborator interface over
/// a shared pool.
#[derive(Clone)]
pub struct SqlCatalog {
    pool: DbPool,
}

impl SqlCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn sources(&self) -> FreightSources {
        FreightSources {
            products: Arc::new(SqlProductRepository::new(self.pool.clone())),
            rates: Arc::new(SqlRateRepository::new(self.pool.clone())),
            zones: Arc::new(SqlZoneRepository::new(self.pool.clone())),
            fuel_rates: Arc::new(SqlFuelRateRepository::new(self.pool.clone())),
            surcharges: Arc::new(SqlSurchargeRepository::new(self.pool.clone())),
            seasonal_surcharges: Arc::new(SqlSeasonalSurchargeRepository::new(self.pool.clone())),
        }
    }
}

#[async_trait]
impl CatalogWriter for SqlCatalog {
    async fn save_product(&self, product: Product) -> Result<(), RepositoryError> {
        SqlProductRepository::new(self.pool.clone()).save(&product).await
    }

    async fn replace_bands(
        &self,
        product_id: &ProductId,
        bands: Vec<RawWeightBand>,
    ) -> Result<(), RepositoryError> {
        SqlRateRepository::new(self.pool.clone()).replace(product_id, &bands).await
    }

    async fn replace_zone_rules(&self, rules: Vec<ZoneRule>) -> Result<(), RepositoryError> {
        SqlZoneRepository::new(self.pool.clone()).replace(&rules).await
    }

    async fn save_fuel_rate(&self, rate: FuelRate) -> Result<(), RepositoryError> {
        SqlFuelRateRepository::new(self.pool.clone()).save(&rate).await
    }

    async fn save_surcharge(
        &self,
        product_id: &ProductId,
        surcharge: Surcharge,
    ) -> Result<(), RepositoryError> {
        SqlSurchargeRepository::new(self.pool.clone()).save(product_id, &surcharge).await
    }

    async fn save_seasonal_surcharge(
        &self,
        product_id: &ProductId,
        surcharge: SeasonalSurcharge,
    ) -> Result<(), RepositoryError> {
        SqlSeasonalSurchargeRepository::new(self.pool.clone()).save(product_id, &surcharge).await
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn decode_date(column: &str, raw: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|error| RepositoryError::Decode(format!("{column} `{raw}`: {error}")))
}

pub(crate) fn decode_optional_date(
    column: &str,
    raw: Option<String>,
) -> Result<Option<NaiveDate>, RepositoryError> {
    raw.filter(|value| !value.trim().is_empty()).map(|value| decode_date(column, &value)).transpose()
}

pub(crate) fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{column} `{raw}`: {error}")))
}

pub(crate) fn decode_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw.trim())
        .map_err(|error| RepositoryError::Decode(format!("{column} `{raw}`: {error}")))
}

pub(crate) fn decode_optional_decimal(
    column: &str,
    raw: Option<String>,
) -> Result<Option<Decimal>, RepositoryError> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| decode_decimal(column, &value))
        .transpose()
}

/// Price maps keep the key spelling they were imported with.
pub(crate) fn encode_price_map(prices: &BTreeMap<String, Decimal>) -> Result<String, RepositoryError> {
    serde_json::to_string(prices).map_err(|error| RepositoryError::Decode(error.to_string()))
}

pub(crate) fn decode_price_map(
    column: &str,
    raw: &str,
) -> Result<BTreeMap<String, Decimal>, RepositoryError> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(raw).map_err(|error| RepositoryError::Decode(format!("{column}: {error}")))
}

pub(crate) fn decode_unit<T>(column: &str, raw: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|error| RepositoryError::Decode(format!("{column}: {error}")))
}
