use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::sources::{
    FreightSources, FuelRateRepository, ProductRepository, RateRepository,
    SeasonalSurchargeRepository, SourceError, SurchargeRepository, ZoneRepository,
};
use super::zone::{ZoneRule, ZoneTable};
use crate::domain::fuel::FuelRate;
use crate::domain::product::{Product, ProductId};
use crate::domain::rate::{PricingMode, RawWeightBand};
use crate::domain::surcharge::{SeasonalSurcharge, Surcharge};
use crate::domain::units::{DimensionUnit, WeightUnit};

/// Mutable in-test rate store implementing every collaborator interface.
#[derive(Default)]
pub(crate) struct FakeStore {
    pub products: RwLock<Vec<Product>>,
    pub bands: RwLock<HashMap<ProductId, Vec<RawWeightBand>>>,
    pub zones: RwLock<ZoneTable>,
    pub fuel_rates: RwLock<Vec<FuelRate>>,
    pub surcharges: RwLock<HashMap<ProductId, Vec<Surcharge>>>,
    pub seasonal: RwLock<HashMap<ProductId, Vec<SeasonalSurcharge>>>,
    pub band_reads: AtomicUsize,
}

impl FakeStore {
    pub fn sources(self: &Arc<Self>) -> FreightSources {
        FreightSources {
            products: self.clone(),
            rates: self.clone(),
            zones: self.clone(),
            fuel_rates: self.clone(),
            surcharges: self.clone(),
            seasonal_surcharges: self.clone(),
        }
    }

    pub fn band_reads(&self) -> usize {
        self.band_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductRepository for FakeStore {
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>, SourceError> {
        Ok(self.products.read().await.iter().find(|product| &product.id == product_id).cloned())
    }
}

#[async_trait]
impl RateRepository for FakeStore {
    async fn list_bands(&self, product_id: &ProductId) -> Result<Vec<RawWeightBand>, SourceError> {
        self.band_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.bands.read().await.get(product_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ZoneRepository for FakeStore {
    async fn resolve(&self, origin: &str, destination: &str) -> Result<Option<String>, SourceError> {
        Ok(self.zones.read().await.lookup(origin, destination).map(str::to_string))
    }
}

#[async_trait]
impl FuelRateRepository for FakeStore {
    async fn list(&self, provider: &str) -> Result<Vec<FuelRate>, SourceError> {
        Ok(self
            .fuel_rates
            .read()
            .await
            .iter()
            .filter(|rate| rate.provider == provider)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SurchargeRepository for FakeStore {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<Surcharge>, SourceError> {
        Ok(self.surcharges.read().await.get(product_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SeasonalSurchargeRepository for FakeStore {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<SeasonalSurcharge>, SourceError> {
        Ok(self.seasonal.read().await.get(product_id).cloned().unwrap_or_default())
    }
}

pub(crate) fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
}

pub(crate) fn ground() -> ProductId {
    ProductId("ground".to_string())
}

pub(crate) fn ground_product() -> Product {
    Product {
        id: ground(),
        name: "Ground".to_string(),
        provider: "acme".to_string(),
        currency: "USD".to_string(),
        weight_unit: WeightUnit::Kg,
        dimension_unit: DimensionUnit::Cm,
        dim_factor: None,
        effective_date: day(1, 1),
        expiration_date: None,
        active: true,
    }
}

pub(crate) fn step_band(weight: i64, prices: &[(&str, i64)]) -> RawWeightBand {
    RawWeightBand {
        weight: Decimal::from(weight),
        weight_unit: WeightUnit::Kg,
        mode: PricingMode::Step,
        reference_weight: None,
        base_prices: prices.iter().map(|(key, price)| (key.to_string(), Decimal::from(*price))).collect(),
        unit_prices: BTreeMap::new(),
    }
}

pub(crate) fn fuel_rate(id: &str, rate_pct: Decimal, effective: NaiveDate) -> FuelRate {
    FuelRate {
        id: id.to_string(),
        provider: "acme".to_string(),
        rate_pct,
        effective_date: effective,
        expiration_date: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("timestamp"),
    }
}

/// The `ground` product with bands [1 kg -> $10, 5 kg -> $20] in zone1,
/// every postal pair charted to zone1 and a 9.75% fuel rate.
pub(crate) async fn ground_store() -> Arc<FakeStore> {
    let store = Arc::new(FakeStore::default());
    store.products.write().await.push(ground_product());
    store
        .bands
        .write()
        .await
        .insert(ground(), vec![step_band(1, &[("zone1", 10)]), step_band(5, &[("zone1", 20)])]);
    *store.zones.write().await = ZoneTable::new(vec![ZoneRule {
        origin: "*".to_string(),
        destination: "*".to_string(),
        zone: "zone1".to_string(),
    }]);
    store.fuel_rates.write().await.push(fuel_rate("fuel-1", Decimal::new(975, 2), day(1, 1)));
    store
}
