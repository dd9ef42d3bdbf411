use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use freightrate_core::config::LoadOptions;
use freightrate_core::freight::batch::BatchReport;
use freightrate_core::{run_batch, BatchCancellation, PackageRequest};
use tracing::{info, warn};

use super::{load_config, CommandError, CommandResult, Engine, EXIT_INPUT, EXIT_RUNTIME};

const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Clone)]
pub struct BatchArgs {
    pub input: PathBuf,
    pub demo: bool,
    pub workers: Option<usize>,
}

pub fn run(mut options: LoadOptions, args: BatchArgs) -> CommandResult {
    if args.workers.is_some() {
        options.overrides.batch_workers = args.workers;
    }
    let config = match load_config("batch", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let requests = match read_requests(&args.input) {
        Ok(requests) => requests,
        Err(error) => {
            return CommandResult::failure("batch", "invalid_input", format!("{error:#}"), EXIT_INPUT)
        }
    };
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "batch",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    let workers = config.batch.workers;
    let result = runtime.block_on(async {
        let engine = Engine::build(&config, args.demo).await?;

        let cancellation = BatchCancellation::default();
        let interrupt = tokio::spawn({
            let cancellation = cancellation.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!(event_name = "freight.cli.batch_interrupted", "stopping batch submissions");
                    cancellation.cancel();
                }
            }
        });

        let report =
            run_batch(engine.orchestrator.clone(), requests, workers, &cancellation).await;
        interrupt.abort();
        engine.close().await;
        Ok::<(BatchReport, bool), CommandError>((report, cancellation.is_cancelled()))
    });

    match result {
        Ok((report, cancelled)) => {
            info!(event_name = "freight.cli.batch_finished", workers, cancelled, "batch finished");
            let message = format!(
                "priced {}, failed {}, skipped {}",
                report.priced, report.failed, report.skipped
            );
            let data = match serde_json::to_value(&report) {
                Ok(data) => data,
                Err(error) => {
                    return CommandResult::failure(
                        "batch",
                        "serialization",
                        error.to_string(),
                        EXIT_RUNTIME,
                    )
                }
            };
            if cancelled {
                CommandResult::failure_with_data(
                    "batch",
                    "cancelled",
                    message,
                    EXIT_CANCELLED,
                    Some(data),
                )
            } else {
                CommandResult::success_with_data("batch", message, Some(data))
            }
        }
        Err(error) => CommandResult::from_error("batch", error),
    }
}

/// Parses JSON Lines input. Blank lines are ignored; errors name the
/// 1-based line they came from.
fn read_requests(path: &Path) -> anyhow::Result<Vec<PackageRequest>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file {}", path.display()))?;

    let mut requests = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let request = serde_json::from_str(line).with_context(|| {
            format!("{} line {} is not a valid package request", path.display(), index + 1)
        })?;
        requests.push(request);
    }

    if requests.is_empty() {
        bail!("{} contains no package requests", path.display());
    }
    Ok(requests)
}
