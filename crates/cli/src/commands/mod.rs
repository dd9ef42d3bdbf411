pub mod batch;
pub mod config;
pub mod migrate;
pub mod quote;
pub mod seed;

use std::sync::Arc;

use freightrate_core::config::{AppConfig, LoadOptions};
use freightrate_core::freight::sources::FreightSources;
use freightrate_core::PricingOrchestrator;
use freightrate_db::{connect_with_settings, DbPool, DemoDataset, InMemoryCatalog, SqlCatalog};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with_data(command, error_class, message, exit_code, None)
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    fn from_error(command: &str, (error_class, message, exit_code): CommandError) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// `(error_class, message, exit_code)` carried out of a command's async block.
pub(crate) type CommandError = (&'static str, String, u8);

pub(crate) const EXIT_CONFIG: u8 = 2;
pub(crate) const EXIT_RUNTIME: u8 = 3;
pub(crate) const EXIT_DATABASE: u8 = 4;
pub(crate) const EXIT_MIGRATION: u8 = 5;
pub(crate) const EXIT_VERIFICATION: u8 = 6;
pub(crate) const EXIT_INPUT: u8 = 7;
pub(crate) const EXIT_PRICING: u8 = 8;

pub(crate) fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn current_thread_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME,
        )
    })
}

pub(crate) async fn connect(config: &AppConfig) -> Result<DbPool, CommandError> {
    connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DATABASE))
}

/// A pricing engine over either the configured database or the built-in
/// demo catalog. Holds the pool so the caller can close it.
pub(crate) struct Engine {
    pub orchestrator: Arc<PricingOrchestrator>,
    pool: Option<DbPool>,
}

impl Engine {
    pub async fn build(config: &AppConfig, demo: bool) -> Result<Self, CommandError> {
        let (sources, pool): (FreightSources, Option<DbPool>) = if demo {
            let catalog = Arc::new(InMemoryCatalog::default());
            DemoDataset::load(catalog.as_ref())
                .await
                .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;
            (catalog.sources(), None)
        } else {
            let pool = connect(config).await?;
            (SqlCatalog::new(pool.clone()).sources(), Some(pool))
        };

        let orchestrator =
            PricingOrchestrator::from_sources(sources, config.pricing.clone(), &config.cache);
        Ok(Self { orchestrator: Arc::new(orchestrator), pool })
    }

    pub async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
        }
    }
}
