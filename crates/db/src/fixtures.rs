use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Deserialize;

use freightrate_core::domain::fuel::FuelRate;
use freightrate_core::domain::package::PackageRequest;
use freightrate_core::domain::product::Product;
use freightrate_core::domain::rate::RawWeightBand;
use freightrate_core::domain::result::PricedResult;
use freightrate_core::domain::surcharge::{SeasonalSurcharge, Surcharge};
use freightrate_core::domain::zone::ZoneId;
use freightrate_core::errors::PricingError;
use freightrate_core::freight::sources::{FreightSources, SourceError};
use freightrate_core::freight::zone::ZoneRule;

use crate::repositories::{CatalogWriter, RepositoryError};

#[derive(Clone, Debug, Deserialize)]
pub struct DemoCatalog {
    pub dataset_version: String,
    pub products: Vec<DemoProduct>,
    pub zone_rules: Vec<ZoneRule>,
    pub fuel_rates: Vec<FuelRate>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DemoProduct {
    pub product: Product,
    pub bands: Vec<RawWeightBand>,
    #[serde(default)]
    pub surcharges: Vec<Surcharge>,
    #[serde(default)]
    pub seasonal_surcharges: Vec<SeasonalSurcharge>,
}

#[derive(Clone, Debug, Deserialize)]
struct DemoQuoteFile {
    dataset_version: String,
    quotes: Vec<DemoQuote>,
}

/// A request against the demo catalog together with its hand-checked price.
#[derive(Clone, Debug, Deserialize)]
pub struct DemoQuote {
    pub name: String,
    pub description: String,
    pub request: PackageRequest,
    pub expect: DemoExpectation,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoExpectation {
    pub status: String,
    #[serde(default)]
    pub zone: Option<ZoneId>,
    #[serde(default)]
    pub base_charge: Option<Decimal>,
    #[serde(default)]
    pub fuel_surcharge: Option<Decimal>,
    #[serde(default)]
    pub surcharge_total: Option<Decimal>,
    #[serde(default)]
    pub total_charge: Option<Decimal>,
    #[serde(default)]
    pub authorized: Option<bool>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl DemoExpectation {
    /// Differences between the expectation and an actual pricing outcome.
    /// Empty means the quote behaved as recorded.
    pub fn mismatches(&self, outcome: &Result<PricedResult, PricingError>) -> Vec<String> {
        let mut mismatches = Vec::new();
        match (self.status.as_str(), outcome) {
            ("priced", Ok(result)) => {
                let mut compare = |field: &str, expected: Option<Decimal>, actual: Decimal| {
                    if let Some(expected) = expected {
                        if expected != actual {
                            mismatches.push(format!("{field}: expected {expected}, got {actual}"));
                        }
                    }
                };
                compare("baseCharge", self.base_charge, result.base_charge);
                compare("fuelSurcharge", self.fuel_surcharge, result.fuel_surcharge);
                compare("surchargeTotal", self.surcharge_total, result.surcharge_total());
                compare("totalCharge", self.total_charge, result.total_charge);

                if let Some(zone) = self.zone.filter(|zone| *zone != result.zone) {
                    mismatches.push(format!("zone: expected {zone}, got {}", result.zone));
                }
                if let Some(authorized) =
                    self.authorized.filter(|authorized| *authorized != result.is_authorized())
                {
                    mismatches.push(format!(
                        "authorized: expected {authorized}, got {}",
                        result.is_authorized()
                    ));
                }
            }
            ("failed", Err(error)) => {
                if let Some(code) = self.error_code.as_deref().filter(|code| *code != error.code()) {
                    mismatches.push(format!("errorCode: expected {code}, got {}", error.code()));
                }
            }
            (expected, Ok(_)) => mismatches.push(format!("status: expected {expected}, got priced")),
            (expected, Err(error)) => {
                mismatches.push(format!("status: expected {expected}, got failed ({error})"))
            }
        }
        mismatches
    }
}

/// Deterministic demo catalog: two live products with legacy zone keys,
/// surcharges of every kind, one retired product, a three-rule zone chart
/// and overlapping fuel rates.
pub struct DemoDataset;

impl DemoDataset {
    pub const CATALOG_JSON: &str = include_str!("../../../config/fixtures/demo_catalog.json");
    pub const QUOTES_JSON: &str = include_str!("../../../config/fixtures/demo_quotes.json");

    pub fn catalog() -> Result<DemoCatalog, RepositoryError> {
        serde_json::from_str(Self::CATALOG_JSON)
            .map_err(|error| RepositoryError::Decode(format!("demo catalog: {error}")))
    }

    pub fn quotes() -> Result<Vec<DemoQuote>, RepositoryError> {
        let file: DemoQuoteFile = serde_json::from_str(Self::QUOTES_JSON)
            .map_err(|error| RepositoryError::Decode(format!("demo quotes: {error}")))?;
        let catalog = Self::catalog()?;
        if file.dataset_version != catalog.dataset_version {
            return Err(RepositoryError::Decode(format!(
                "demo quotes target dataset {} but the catalog is {}",
                file.dataset_version, catalog.dataset_version
            )));
        }
        Ok(file.quotes)
    }

    /// Writes the catalog through `writer`. Re-running replaces rather than
    /// duplicates.
    pub async fn load(writer: &dyn CatalogWriter) -> Result<SeedResult, RepositoryError> {
        let catalog = Self::catalog()?;
        let mut result = SeedResult {
            dataset_version: catalog.dataset_version.clone(),
            products: 0,
            bands: 0,
            surcharges: 0,
            zone_rules: catalog.zone_rules.len(),
            fuel_rates: catalog.fuel_rates.len(),
        };

        for entry in catalog.products {
            let product_id = entry.product.id.clone();
            writer.save_product(entry.product).await?;
            result.products += 1;

            result.bands += entry.bands.len();
            writer.replace_bands(&product_id, entry.bands).await?;

            for surcharge in entry.surcharges {
                writer.save_surcharge(&product_id, surcharge).await?;
                result.surcharges += 1;
            }
            for surcharge in entry.seasonal_surcharges {
                writer.save_seasonal_surcharge(&product_id, surcharge).await?;
                result.surcharges += 1;
            }
        }

        writer.replace_zone_rules(catalog.zone_rules).await?;
        for rate in catalog.fuel_rates {
            writer.save_fuel_rate(rate).await?;
        }

        Ok(result)
    }

    /// Reads the catalog back through the engine's collaborator interfaces.
    pub async fn verify(sources: &FreightSources) -> Result<VerificationResult, SourceError> {
        let catalog = Self::catalog()?;
        let mut checks = Vec::new();

        for entry in &catalog.products {
            let id = &entry.product.id;
            let stored = sources.products.get(id).await?;
            checks.push((format!("product:{id}"), stored.as_ref() == Some(&entry.product)));

            let bands = sources.rates.list_bands(id).await?;
            checks.push((format!("bands:{id}"), bands.len() == entry.bands.len()));

            let surcharges = sources.surcharges.list(id).await?;
            checks.push((format!("surcharges:{id}"), surcharges.len() == entry.surcharges.len()));

            let seasonal = sources.seasonal_surcharges.list(id).await?;
            checks.push((
                format!("seasonal_surcharges:{id}"),
                seasonal.len() == entry.seasonal_surcharges.len(),
            ));
        }

        let providers: BTreeSet<&str> =
            catalog.fuel_rates.iter().map(|rate| rate.provider.as_str()).collect();
        for provider in providers {
            let expected =
                catalog.fuel_rates.iter().filter(|rate| rate.provider == provider).count();
            let stored = sources.fuel_rates.list(provider).await?;
            checks.push((format!("fuel_rates:{provider}"), stored.len() == expected));
        }

        for rule in &catalog.zone_rules {
            let origin = rule.origin.replace('*', "0");
            let destination = rule.destination.replace('*', "0");
            let resolved = sources.zones.resolve(&origin, &destination).await?;
            checks.push((format!("zone:{}->{}", rule.origin, rule.destination), resolved.is_some()));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub dataset_version: String,
    pub products: usize,
    pub bands: usize,
    pub surcharges: usize,
    pub zone_rules: usize,
    pub fuel_rates: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}
