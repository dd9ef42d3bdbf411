use std::env;
use std::fs;
use std::path::Path;

use freightrate_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// One reported setting: its dotted file key, rendered value and the
/// environment variables that can set it, in precedence order.
struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl Field {
    fn new(key: &'static str, value: impl ToString, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.to_string(), env_keys }
    }
}

pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }
    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let pricing = &config.pricing;
    let minimum_fuel_fee =
        pricing.minimum_fuel_fee.map(|fee| fee.to_string()).unwrap_or_else(|| "<unset>".into());

    vec![
        Field::new("database.url", &config.database.url, &["FREIGHTRATE_DATABASE_URL"]),
        Field::new(
            "database.max_connections",
            config.database.max_connections,
            &["FREIGHTRATE_DATABASE_MAX_CONNECTIONS"],
        ),
        Field::new(
            "database.timeout_secs",
            config.database.timeout_secs,
            &["FREIGHTRATE_DATABASE_TIMEOUT_SECS"],
        ),
        Field::new("pricing.default_zone", pricing.default_zone, &["FREIGHTRATE_PRICING_DEFAULT_ZONE"]),
        Field::new(
            "pricing.default_fuel_rate_pct",
            pricing.default_fuel_rate_pct,
            &["FREIGHTRATE_PRICING_DEFAULT_FUEL_RATE_PCT"],
        ),
        Field::new(
            "pricing.minimum_fuel_fee",
            minimum_fuel_fee,
            &["FREIGHTRATE_PRICING_MINIMUM_FUEL_FEE"],
        ),
        Field::new("pricing.default_dim_divisor_metric", pricing.default_dim_divisor_metric, &[]),
        Field::new(
            "pricing.default_dim_divisor_imperial",
            pricing.default_dim_divisor_imperial,
            &[],
        ),
        Field::new(
            "pricing.strict_input",
            pricing.strict_input,
            &["FREIGHTRATE_PRICING_STRICT_INPUT"],
        ),
        Field::new(
            "pricing.placeholder_weight",
            pricing.placeholder_weight,
            &["FREIGHTRATE_PRICING_PLACEHOLDER_WEIGHT"],
        ),
        Field::new(
            "pricing.placeholder_dimension",
            pricing.placeholder_dimension,
            &["FREIGHTRATE_PRICING_PLACEHOLDER_DIMENSION"],
        ),
        Field::new("pricing.max_weight_lb", pricing.limits.max_weight_lb, &[]),
        Field::new("pricing.max_length_in", pricing.limits.max_length_in, &[]),
        Field::new("pricing.max_length_girth_in", pricing.limits.max_length_girth_in, &[]),
        Field::new(
            "cache.zone_ttl_secs",
            config.cache.zone_ttl_secs,
            &["FREIGHTRATE_CACHE_ZONE_TTL_SECS"],
        ),
        Field::new(
            "cache.fuel_ttl_secs",
            config.cache.fuel_ttl_secs,
            &["FREIGHTRATE_CACHE_FUEL_TTL_SECS"],
        ),
        Field::new("batch.workers", config.batch.workers, &["FREIGHTRATE_BATCH_WORKERS"]),
        Field::new(
            "logging.level",
            &config.logging.level,
            &["FREIGHTRATE_LOGGING_LEVEL", "FREIGHTRATE_LOG_LEVEL"],
        ),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["FREIGHTRATE_LOGGING_FORMAT", "FREIGHTRATE_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
