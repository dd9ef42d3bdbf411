use freightrate_core::config::LoadOptions;
use freightrate_db::migrations;
use tracing::info;

use super::{connect, current_thread_runtime, load_config, CommandResult, EXIT_MIGRATION};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("migrate", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match current_thread_runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;
        let applied = migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION));
        pool.close().await;
        applied
    });

    match result {
        Ok(()) => {
            info!(
                event_name = "freight.cli.migrated",
                database_url = %config.database.url,
                "migrations applied"
            );
            CommandResult::success("migrate", "applied pending migrations")
        }
        Err(error) => CommandResult::from_error("migrate", error),
    }
}
