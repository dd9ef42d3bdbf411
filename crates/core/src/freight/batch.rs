use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::calculator::PricingOrchestrator;
use crate::domain::package::PackageRequest;
use crate::domain::result::PricedResult;

/// Cooperative stop signal for a running batch. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct BatchCancellation(Arc<AtomicBool>);

impl BatchCancellation {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItemOutcome {
    Priced { result: Box<PricedResult> },
    Failed { code: String, message: String },
    /// Never submitted because the batch was cancelled first.
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub index: usize,
    #[serde(flatten)]
    pub outcome: BatchItemOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub priced: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchReport {
    fn from_outcomes(outcomes: Vec<Option<BatchItemOutcome>>) -> Self {
        let items: Vec<BatchItem> = outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| BatchItem {
                index,
                outcome: outcome.unwrap_or_else(|| BatchItemOutcome::Failed {
                    code: "worker_failed".to_string(),
                    message: "pricing task terminated before producing a result".to_string(),
                }),
            })
            .collect();

        let count = |predicate: fn(&BatchItemOutcome) -> bool| {
            items.iter().filter(|item| predicate(&item.outcome)).count()
        };
        let priced = count(|outcome| matches!(outcome, BatchItemOutcome::Priced { .. }));
        let failed = count(|outcome| matches!(outcome, BatchItemOutcome::Failed { .. }));
        let skipped = count(|outcome| matches!(outcome, BatchItemOutcome::Skipped));

        Self { items, priced, failed, skipped }
    }
}

/// Prices `requests` on at most `workers` concurrent tasks.
///
/// Items come back in input order. Cancellation stops new submissions;
/// calculations already running finish and unsent items are `Skipped`.
pub async fn run_batch(
    orchestrator: Arc<PricingOrchestrator>,
    requests: Vec<PackageRequest>,
    workers: usize,
    cancellation: &BatchCancellation,
) -> BatchReport {
    let started = Instant::now();
    let total = requests.len();
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut outcomes: Vec<Option<BatchItemOutcome>> = vec![None; total];
    let mut tasks = JoinSet::new();

    for (index, request) in requests.into_iter().enumerate() {
        if cancellation.is_cancelled() {
            outcomes[index] = Some(BatchItemOutcome::Skipped);
            continue;
        }

        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            outcomes[index] = Some(BatchItemOutcome::Skipped);
            continue;
        };
        if cancellation.is_cancelled() {
            outcomes[index] = Some(BatchItemOutcome::Skipped);
            continue;
        }

        let orchestrator = orchestrator.clone();
        tasks.spawn(async move {
            let outcome = match orchestrator.calculate(&request).await {
                Ok(result) => BatchItemOutcome::Priced { result: Box::new(result) },
                Err(error) => {
                    BatchItemOutcome::Failed { code: error.code().to_string(), message: error.to_string() }
                }
            };
            drop(permit);
            (index, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(error) => {
                warn!(event_name = "freight.batch.worker_failed", error = %error, "pricing task failed");
            }
        }
    }

    let report = BatchReport::from_outcomes(outcomes);
    info!(
        event_name = "freight.batch.completed",
        total,
        priced = report.priced,
        failed = report.failed,
        skipped = report.skipped,
        cancelled = cancellation.is_cancelled(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch pricing completed"
    );
    report
}
