use std::sync::Arc;

use freightrate_core::config::{CacheConfig, PricingConfig};
use freightrate_core::domain::result::Diagnostic;
use freightrate_core::freight::sources::FreightSources;
use freightrate_core::PricingOrchestrator;
use freightrate_db::{connect_with_settings, migrations, DemoDataset, InMemoryCatalog, SqlCatalog};
use serde_json::Value;

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

fn orchestrator(sources: FreightSources) -> PricingOrchestrator {
    PricingOrchestrator::from_sources(
        sources,
        PricingConfig::default(),
        &CacheConfig { zone_ttl_secs: 300, fuel_ttl_secs: 0 },
    )
}

async fn sqlite_sources() -> SeedContractTestResult<FreightSources> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    let catalog = SqlCatalog::new(pool);
    DemoDataset::load(&catalog).await.map_err(|error| format!("seed: {error}"))?;
    Ok(catalog.sources())
}

async fn memory_sources() -> SeedContractTestResult<FreightSources> {
    let catalog = Arc::new(InMemoryCatalog::default());
    DemoDataset::load(catalog.as_ref()).await.map_err(|error| format!("seed: {error}"))?;
    Ok(catalog.sources())
}

async fn assert_demo_quotes(sources: FreightSources, backend: &str) -> SeedContractTestResult {
    let orchestrator = orchestrator(sources);
    let quotes = DemoDataset::quotes().map_err(|error| format!("quotes: {error}"))?;
    require!(!quotes.is_empty(), "demo quotes should not be empty");

    for quote in quotes {
        let outcome = orchestrator.calculate(&quote.request).await;
        let mismatches = quote.expect.mismatches(&outcome);
        require!(
            mismatches.is_empty(),
            "[{backend}] {} ({}) diverged: {mismatches:?}",
            quote.name,
            quote.description
        );
    }
    Ok(())
}

#[tokio::test]
async fn demo_quotes_price_as_recorded_on_sqlite() -> SeedContractTestResult {
    assert_demo_quotes(sqlite_sources().await?, "sqlite").await
}

#[tokio::test]
async fn demo_quotes_price_as_recorded_in_memory() -> SeedContractTestResult {
    assert_demo_quotes(memory_sources().await?, "memory").await
}

#[tokio::test]
async fn legacy_zone_keys_are_normalized_and_reported() -> SeedContractTestResult {
    let orchestrator = orchestrator(sqlite_sources().await?);
    let quotes = DemoDataset::quotes().map_err(|error| format!("quotes: {error}"))?;
    let quote = quotes
        .iter()
        .find(|quote| quote.name == "ground_linear_residential")
        .ok_or("ground_linear_residential quote should exist")?;

    let result = orchestrator
        .calculate(&quote.request)
        .await
        .map_err(|error| format!("pricing failed: {error}"))?;

    require_eq!(result.diagnostics.zone_key_used.as_deref(), Some("zone2"));
    require!(
        result.has_diagnostic(|diagnostic| matches!(
            diagnostic,
            Diagnostic::ZoneKeysDropped { keys } if keys == &vec!["legacy".to_string()]
        )),
        "unrecognized `legacy` key should be reported, got {:?}",
        result.diagnostics.reasons
    );
    Ok(())
}

#[tokio::test]
async fn unauthorized_freight_lists_every_violated_limit() -> SeedContractTestResult {
    let orchestrator = orchestrator(memory_sources().await?);
    let quotes = DemoDataset::quotes().map_err(|error| format!("quotes: {error}"))?;
    let quote = quotes
        .iter()
        .find(|quote| quote.name == "freight_unauthorized")
        .ok_or("freight_unauthorized quote should exist")?;

    let result = orchestrator
        .calculate(&quote.request)
        .await
        .map_err(|error| format!("pricing failed: {error}"))?;

    require_eq!(result.unauthorized_reasons.len(), 3, "got {:?}", result.unauthorized_reasons);
    let types: Vec<_> =
        result.surcharges.iter().map(|line| line.sub_type.as_deref().unwrap_or("")).collect();
    require_eq!(types, vec!["OVERWEIGHT", "OVERLENGTH"], "got {types:?}");
    Ok(())
}

#[test]
fn quote_fixture_matches_catalog_contract() -> SeedContractTestResult {
    let quotes: Value = serde_json::from_str(DemoDataset::QUOTES_JSON)
        .map_err(|error| format!("quotes JSON must parse: {error}"))?;
    let catalog: Value = serde_json::from_str(DemoDataset::CATALOG_JSON)
        .map_err(|error| format!("catalog JSON must parse: {error}"))?;

    require_eq!(quotes["dataset_version"], catalog["dataset_version"]);

    let product_ids: Vec<&str> = catalog["products"]
        .as_array()
        .ok_or("products should be an array")?
        .iter()
        .filter_map(|entry| entry["product"]["id"].as_str())
        .collect();

    for quote in quotes["quotes"].as_array().ok_or("quotes should be an array")? {
        let name = quote["name"].as_str().ok_or("quote name should be a string")?;
        let product_id =
            quote["request"]["productId"].as_str().ok_or("productId should be a string")?;
        let status = quote["expect"]["status"].as_str().ok_or("status should be a string")?;

        match status {
            "priced" => {
                require!(product_ids.contains(&product_id), "{name} prices unknown {product_id}");
                for field in ["baseCharge", "fuelSurcharge", "totalCharge"] {
                    require!(
                        quote["expect"][field].is_string(),
                        "{name} should record {field} as a decimal string"
                    );
                }
            }
            "failed" => {
                require!(
                    quote["expect"]["errorCode"].is_string(),
                    "{name} should record an errorCode"
                );
            }
            other => return Err(format!("{name} has unknown status {other}")),
        }
    }
    Ok(())
}
