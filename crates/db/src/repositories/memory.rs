use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use freightrate_core::domain::fuel::FuelRate;
use freightrate_core::domain::product::{Product, ProductId};
use freightrate_core::domain::rate::RawWeightBand;
use freightrate_core::domain::surcharge::{SeasonalSurcharge, Surcharge};
use freightrate_core::freight::sources::{
    FreightSources, FuelRateRepository, ProductRepository, RateRepository,
    SeasonalSurchargeRepository, SourceError, SurchargeRepository, ZoneRepository,
};
use freightrate_core::freight::zone::{ZoneRule, ZoneTable};

use super::{CatalogWriter, RepositoryError};

/// Rate store held in process memory. Serves demo runs and tests with the
/// same contracts as the SQLite repositories.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<String, Product>>,
    bands: RwLock<HashMap<String, Vec<RawWeightBand>>>,
    zones: RwLock<ZoneTable>,
    fuel_rates: RwLock<HashMap<String, FuelRate>>,
    surcharges: RwLock<HashMap<String, Vec<Surcharge>>>,
    seasonal_surcharges: RwLock<HashMap<String, Vec<SeasonalSurcharge>>>,
}

impl InMemoryCatalog {
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
}

fn upsert_by_id<T>(rows: &mut Vec<T>, row: T, id: impl Fn(&T) -> &str) {
    let key = id(&row).to_string();
    match rows.iter_mut().find(|existing| id(&**existing) == key) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
}

#[async_trait]
impl CatalogWriter for InMemoryCatalog {
    async fn save_product(&self, product: Product) -> Result<(), RepositoryError> {
        self.products.write().await.insert(product.id.0.clone(), product);
        Ok(())
    }

    async fn replace_bands(
        &self,
        product_id: &ProductId,
        mut bands: Vec<RawWeightBand>,
    ) -> Result<(), RepositoryError> {
        bands.sort_by(|left, right| left.weight.cmp(&right.weight));
        self.bands.write().await.insert(product_id.0.clone(), bands);
        Ok(())
    }

    async fn replace_zone_rules(&self, rules: Vec<ZoneRule>) -> Result<(), RepositoryError> {
        *self.zones.write().await = ZoneTable::new(rules);
        Ok(())
    }

    async fn save_fuel_rate(&self, rate: FuelRate) -> Result<(), RepositoryError> {
        self.fuel_rates.write().await.insert(rate.id.clone(), rate);
        Ok(())
    }

    async fn save_surcharge(
        &self,
        product_id: &ProductId,
        surcharge: Surcharge,
    ) -> Result<(), RepositoryError> {
        let mut surcharges = self.surcharges.write().await;
        let rows = surcharges.entry(product_id.0.clone()).or_default();
        upsert_by_id(rows, surcharge, |row| row.id.as_str());
        rows.sort_by(|left, right| {
            left.display_order.cmp(&right.display_order).then_with(|| left.id.cmp(&right.id))
        });
        Ok(())
    }

    async fn save_seasonal_surcharge(
        &self,
        product_id: &ProductId,
        surcharge: SeasonalSurcharge,
    ) -> Result<(), RepositoryError> {
        let mut seasonal = self.seasonal_surcharges.write().await;
        let rows = seasonal.entry(product_id.0.clone()).or_default();
        upsert_by_id(rows, surcharge, |row| row.id.as_str());
        rows.sort_by(|left, right| {
            left.start_date.cmp(&right.start_date).then_with(|| left.id.cmp(&right.id))
        });
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalog {
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>, SourceError> {
        Ok(self.products.read().await.get(&product_id.0).cloned())
    }
}

#[async_trait]
impl RateRepository for InMemoryCatalog {
    async fn list_bands(&self, product_id: &ProductId) -> Result<Vec<RawWeightBand>, SourceError> {
        Ok(self.bands.read().await.get(&product_id.0).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ZoneRepository for InMemoryCatalog {
    async fn resolve(&self, origin: &str, destination: &str) -> Result<Option<String>, SourceError> {
        Ok(self.zones.read().await.lookup(origin, destination).map(str::to_string))
    }
}

#[async_trait]
impl FuelRateRepository for InMemoryCatalog {
    async fn list(&self, provider: &str) -> Result<Vec<FuelRate>, SourceError> {
        let mut rates: Vec<FuelRate> = self
            .fuel_rates
            .read()
            .await
            .values()
            .filter(|rate| rate.provider == provider)
            .cloned()
            .collect();
        rates.sort_by(|left, right| {
            (left.effective_date, left.created_at, &left.id)
                .cmp(&(right.effective_date, right.created_at, &right.id))
        });
        Ok(rates)
    }
}

#[async_trait]
impl SurchargeRepository for InMemoryCatalog {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<Surcharge>, SourceError> {
        Ok(self.surcharges.read().await.get(&product_id.0).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SeasonalSurchargeRepository for InMemoryCatalog {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<SeasonalSurcharge>, SourceError> {
        Ok(self.seasonal_surcharges.read().await.get(&product_id.0).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use freightrate_core::domain::product::ProductId;
    use freightrate_core::domain::surcharge::Surcharge;
    use freightrate_core::freight::sources::{SurchargeRepository, ZoneRepository};
    use freightrate_core::freight::zone::ZoneRule;

    use super::InMemoryCatalog;
    use crate::repositories::CatalogWriter;

    fn surcharge(id: &str, order: i32, fee: i64) -> Surcharge {
        Surcharge {
            id: id.to_string(),
            surcharge_type: "RESIDENTIAL".to_string(),
            sub_type: None,
            name: "Residential".to_string(),
            condition: "residential".to_string(),
            fees: BTreeMap::from([("default".to_string(), Decimal::from(fee))]),
            display_order: order,
        }
    }

    #[tokio::test]
    async fn saving_a_surcharge_twice_replaces_it_in_order() {
        let catalog = InMemoryCatalog::default();
        let ground = ProductId("ground".to_string());

        catalog.save_surcharge(&ground, surcharge("b", 2, 5)).await.expect("save");
        catalog.save_surcharge(&ground, surcharge("a", 1, 4)).await.expect("save");
        catalog.save_surcharge(&ground, surcharge("b", 2, 6)).await.expect("save");

        let listed = catalog.list(&ground).await.expect("list");
        let summary: Vec<_> = listed
            .iter()
            .map(|row| (row.id.as_str(), row.fees["default"]))
            .collect();
        assert_eq!(summary, vec![("a", Decimal::from(4)), ("b", Decimal::from(6))]);
    }

    #[tokio::test]
    async fn sources_share_the_catalog() {
        let catalog = Arc::new(InMemoryCatalog::default());
        let sources = catalog.sources();

        catalog
            .replace_zone_rules(vec![ZoneRule {
                origin: "100*".to_string(),
                destination: "*".to_string(),
                zone: "zone2".to_string(),
            }])
            .await
            .expect("replace");

        assert_eq!(
            sources.zones.resolve("10001", "60601").await.expect("resolve"),
            Some("zone2".to_string())
        );
        assert_eq!(sources.zones.resolve("20001", "60601").await.expect("resolve"), None);
    }
}
