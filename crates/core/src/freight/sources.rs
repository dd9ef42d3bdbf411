//! Read interfaces onto the rate store. Implementations live in
//! `freightrate-db`; the engine only ever reads through these.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::fuel::FuelRate;
use crate::domain::product::{Product, ProductId};
use crate::domain::rate::RawWeightBand;
use crate::domain::surcharge::{SeasonalSurcharge, Surcharge};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("rate store unavailable: {0}")]
    Unavailable(String),
    #[error("rate store returned malformed data: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>, SourceError>;
}

#[async_trait]
pub trait RateRepository: Send + Sync {
    /// Bands of the product ordered by weight ascending.
    async fn list_bands(&self, product_id: &ProductId) -> Result<Vec<RawWeightBand>, SourceError>;
}

#[async_trait]
pub trait ZoneRepository: Send + Sync {
    /// Most specific zone label for the (already normalized) postal pair.
    async fn resolve(&self, origin: &str, destination: &str) -> Result<Option<String>, SourceError>;
}

#[async_trait]
pub trait FuelRateRepository: Send + Sync {
    async fn list(&self, provider: &str) -> Result<Vec<FuelRate>, SourceError>;
}

#[async_trait]
pub trait SurchargeRepository: Send + Sync {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<Surcharge>, SourceError>;
}

#[async_trait]
pub trait SeasonalSurchargeRepository: Send + Sync {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<SeasonalSurcharge>, SourceError>;
}

/// The collaborators the pricing engine reads from.
#[derive(Clone)]
pub struct FreightSources {
    pub products: Arc<dyn ProductRepository>,
    pub rates: Arc<dyn RateRepository>,
    pub zones: Arc<dyn ZoneRepository>,
    pub fuel_rates: Arc<dyn FuelRateRepository>,
    pub surcharges: Arc<dyn SurchargeRepository>,
    pub seasonal_surcharges: Arc<dyn SeasonalSurchargeRepository>,
}
