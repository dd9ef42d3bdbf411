use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use freightrate_core::config::LoadOptions;
use freightrate_core::PackageRequest;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::{
    current_thread_runtime, load_config, CommandError, CommandResult, Engine, EXIT_INPUT,
    EXIT_PRICING,
};

#[derive(Debug, Clone)]
pub struct QuoteArgs {
    pub input: PathBuf,
    pub demo: bool,
}

pub fn run(options: LoadOptions, args: QuoteArgs) -> CommandResult {
    let config = match load_config("quote", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let request = match read_request(&args.input) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure("quote", "invalid_input", format!("{error:#}"), EXIT_INPUT)
        }
    };
    let runtime = match current_thread_runtime("quote") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let engine = Engine::build(&config, args.demo).await?;
        let priced = engine.orchestrator.calculate(&request).await;
        engine.close().await;
        Ok::<_, CommandError>(priced)
    });

    match result {
        Ok(Ok(priced)) => {
            let message = format!(
                "priced {} in {}: total {} {}",
                priced.product_id, priced.zone, priced.total_charge, priced.currency
            );
            match serde_json::to_value(&priced) {
                Ok(data) => CommandResult::success_with_data("quote", message, Some(data)),
                Err(error) => {
                    CommandResult::failure("quote", "serialization", error.to_string(), EXIT_PRICING)
                }
            }
        }
        Ok(Err(error)) => {
            let detail = error.to_string();
            let interface = error.into_interface(Uuid::new_v4().to_string());
            warn!(
                event_name = "freight.cli.quote_failed",
                code = interface.code(),
                correlation_id = interface.correlation_id(),
                error = %detail,
                "quote failed"
            );
            CommandResult::failure_with_data(
                "quote",
                interface.code(),
                interface.user_message(),
                EXIT_PRICING,
                Some(json!({
                    "correlation_id": interface.correlation_id(),
                    "detail": detail,
                })),
            )
        }
        Err(error) => CommandResult::from_error("quote", error),
    }
}

fn read_request(path: &Path) -> anyhow::Result<PackageRequest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid package request", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::read_request;

    #[test]
    fn request_file_is_parsed_from_camel_case_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("request.json");
        fs::write(
            &path,
            r#"{"productId":"ground","weight":"2","weightUnit":"KG","originPostal":"10001","destPostal":"94105"}"#,
        )
        .expect("write");

        let request = read_request(&path).expect("request");
        assert_eq!(request.product_id, "ground");
        assert_eq!(request.origin_postal, "10001");
    }

    #[test]
    fn unreadable_request_names_the_file() {
        let error = read_request(std::path::Path::new("does-not-exist.json")).expect_err("missing");

        assert!(format!("{error:#}").contains("does-not-exist.json"));
    }
}
