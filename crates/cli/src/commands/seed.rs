use freightrate_core::config::LoadOptions;
use freightrate_db::{migrations, DemoDataset, SeedResult, SqlCatalog};
use serde_json::json;

use super::{
    connect, current_thread_runtime, load_config, CommandError, CommandResult, EXIT_MIGRATION,
    EXIT_VERIFICATION,
};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match current_thread_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let outcome = seed_and_verify(&SqlCatalog::new(pool.clone())).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(seeded) => CommandResult::success_with_data("seed", summary(&seeded), Some(counts(&seeded))),
        Err(error) => CommandResult::from_error("seed", error),
    }
}

async fn seed_and_verify(catalog: &SqlCatalog) -> Result<SeedResult, CommandError> {
    let seeded = DemoDataset::load(catalog)
        .await
        .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;
    let verification = DemoDataset::verify(&catalog.sources())
        .await
        .map_err(|error| ("seed_verification", error.to_string(), EXIT_VERIFICATION))?;

    if verification.all_present {
        return Ok(seeded);
    }
    let failed_checks: Vec<&str> = verification
        .checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
        .collect();
    Err(("seed_verification", verification_message(&failed_checks), EXIT_VERIFICATION))
}

fn summary(seeded: &SeedResult) -> String {
    format!(
        "demo catalog {} loaded: {} products, {} weight bands, {} surcharges, {} zone rules, {} fuel rates",
        seeded.dataset_version,
        seeded.products,
        seeded.bands,
        seeded.surcharges,
        seeded.zone_rules,
        seeded.fuel_rates
    )
}

fn counts(seeded: &SeedResult) -> serde_json::Value {
    json!({
        "dataset_version": seeded.dataset_version,
        "products": seeded.products,
        "bands": seeded.bands,
        "surcharges": seeded.surcharges,
        "zone_rules": seeded.zone_rules,
        "fuel_rates": seeded.fuel_rates,
    })
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "some demo data failed to load".to_string()
    } else {
        format!("seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let message = verification_message(&["bands:ground", "zone:100*->941*"]);

        assert_eq!(message, "seed verification failed for checks: bands:ground, zone:100*->941*");
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "some demo data failed to load");
    }
}
