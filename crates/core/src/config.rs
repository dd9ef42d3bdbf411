use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::zone::ZoneId;
use crate::freight::limits::PackageLimits;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["freightrate.toml", "config/freightrate.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Knobs of the pricing engine. Decimal values are written as strings in the
/// TOML file (`default_fuel_rate_pct = "9.75"`) so no precision is lost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingConfig {
    pub default_zone: ZoneId,
    pub default_fuel_rate_pct: Decimal,
    pub minimum_fuel_fee: Option<Decimal>,
    pub default_dim_divisor_metric: Decimal,
    pub default_dim_divisor_imperial: Decimal,
    /// Reject requests with missing weight or dimensions instead of applying
    /// placeholders.
    pub strict_input: bool,
    pub placeholder_weight: Decimal,
    pub placeholder_dimension: Decimal,
    pub limits: PackageLimits,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub zone_ttl_secs: u64,
    /// Zero disables expiry; fuel rows are then refreshed only on invalidation.
    pub fuel_ttl_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    pub workers: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub strict_input: Option<bool>,
    pub batch_workers: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid value for `{key}`: `{value}`")]
    InvalidValue { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_zone: ZoneId(1),
            default_fuel_rate_pct: Decimal::ZERO,
            minimum_fuel_fee: None,
            default_dim_divisor_metric: Decimal::from(5000),
            default_dim_divisor_imperial: Decimal::from(139),
            strict_input: false,
            placeholder_weight: Decimal::ONE,
            placeholder_dimension: Decimal::TEN,
            limits: PackageLimits::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://freightrate.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pricing: PricingConfig::default(),
            cache: CacheConfig { zone_ttl_secs: 300, fuel_ttl_secs: 0 },
            batch: BatchConfig { workers: 4 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl CacheConfig {
    pub fn zone_ttl(&self) -> Duration {
        Duration::from_secs(self.zone_ttl_secs)
    }

    pub fn fuel_ttl(&self) -> Option<Duration> {
        (self.fuel_ttl_secs > 0).then(|| Duration::from_secs(self.fuel_ttl_secs))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(pricing) = patch.pricing {
            let pricing_config = &mut self.pricing;
            if let Some(zone) = pricing.default_zone {
                pricing_config.default_zone = parse_zone("pricing.default_zone", &zone)?;
            }
            if let Some(value) = pricing.default_fuel_rate_pct {
                pricing_config.default_fuel_rate_pct =
                    parse_decimal("pricing.default_fuel_rate_pct", &value)?;
            }
            if let Some(value) = pricing.minimum_fuel_fee {
                pricing_config.minimum_fuel_fee =
                    Some(parse_decimal("pricing.minimum_fuel_fee", &value)?);
            }
            if let Some(value) = pricing.default_dim_divisor_metric {
                pricing_config.default_dim_divisor_metric =
                    parse_decimal("pricing.default_dim_divisor_metric", &value)?;
            }
            if let Some(value) = pricing.default_dim_divisor_imperial {
                pricing_config.default_dim_divisor_imperial =
                    parse_decimal("pricing.default_dim_divisor_imperial", &value)?;
            }
            if let Some(strict_input) = pricing.strict_input {
                pricing_config.strict_input = strict_input;
            }
            if let Some(value) = pricing.placeholder_weight {
                pricing_config.placeholder_weight =
                    parse_decimal("pricing.placeholder_weight", &value)?;
            }
            if let Some(value) = pricing.placeholder_dimension {
                pricing_config.placeholder_dimension =
                    parse_decimal("pricing.placeholder_dimension", &value)?;
            }
            if let Some(value) = pricing.max_weight_lb {
                pricing_config.limits.max_weight_lb = parse_decimal("pricing.max_weight_lb", &value)?;
            }
            if let Some(value) = pricing.max_length_in {
                pricing_config.limits.max_length_in = parse_decimal("pricing.max_length_in", &value)?;
            }
            if let Some(value) = pricing.max_length_girth_in {
                pricing_config.limits.max_length_girth_in =
                    parse_decimal("pricing.max_length_girth_in", &value)?;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(zone_ttl_secs) = cache.zone_ttl_secs {
                self.cache.zone_ttl_secs = zone_ttl_secs;
            }
            if let Some(fuel_ttl_secs) = cache.fuel_ttl_secs {
                self.cache.fuel_ttl_secs = fuel_ttl_secs;
            }
        }

        if let Some(batch) = patch.batch {
            if let Some(workers) = batch.workers {
                self.batch.workers = workers;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FREIGHTRATE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FREIGHTRATE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("FREIGHTRATE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FREIGHTRATE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("FREIGHTRATE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FREIGHTRATE_PRICING_DEFAULT_ZONE") {
            self.pricing.default_zone = parse_zone("FREIGHTRATE_PRICING_DEFAULT_ZONE", &value)?;
        }
        if let Some(value) = read_env("FREIGHTRATE_PRICING_DEFAULT_FUEL_RATE_PCT") {
            self.pricing.default_fuel_rate_pct =
                parse_env("FREIGHTRATE_PRICING_DEFAULT_FUEL_RATE_PCT", &value)?;
        }
        if let Some(value) = read_env("FREIGHTRATE_PRICING_MINIMUM_FUEL_FEE") {
            self.pricing.minimum_fuel_fee =
                Some(parse_env("FREIGHTRATE_PRICING_MINIMUM_FUEL_FEE", &value)?);
        }
        if let Some(value) = read_env("FREIGHTRATE_PRICING_STRICT_INPUT") {
            self.pricing.strict_input = parse_env("FREIGHTRATE_PRICING_STRICT_INPUT", &value)?;
        }
        if let Some(value) = read_env("FREIGHTRATE_PRICING_PLACEHOLDER_WEIGHT") {
            self.pricing.placeholder_weight =
                parse_env("FREIGHTRATE_PRICING_PLACEHOLDER_WEIGHT", &value)?;
        }
        if let Some(value) = read_env("FREIGHTRATE_PRICING_PLACEHOLDER_DIMENSION") {
            self.pricing.placeholder_dimension =
                parse_env("FREIGHTRATE_PRICING_PLACEHOLDER_DIMENSION", &value)?;
        }

        if let Some(value) = read_env("FREIGHTRATE_CACHE_ZONE_TTL_SECS") {
            self.cache.zone_ttl_secs = parse_env("FREIGHTRATE_CACHE_ZONE_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("FREIGHTRATE_CACHE_FUEL_TTL_SECS") {
            self.cache.fuel_ttl_secs = parse_env("FREIGHTRATE_CACHE_FUEL_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("FREIGHTRATE_BATCH_WORKERS") {
            self.batch.workers = parse_env("FREIGHTRATE_BATCH_WORKERS", &value)?;
        }

        let log_level =
            read_env("FREIGHTRATE_LOGGING_LEVEL").or_else(|| read_env("FREIGHTRATE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FREIGHTRATE_LOGGING_FORMAT").or_else(|| read_env("FREIGHTRATE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(strict_input) = overrides.strict_input {
            self.pricing.strict_input = strict_input;
        }
        if let Some(workers) = overrides.batch_workers {
            self.batch.workers = workers;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_pricing(&self.pricing)?;
        validate_batch(&self.batch)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing config file: the explicit path, else the default candidates.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    let positive = [
        ("pricing.default_dim_divisor_metric", pricing.default_dim_divisor_metric),
        ("pricing.default_dim_divisor_imperial", pricing.default_dim_divisor_imperial),
        ("pricing.placeholder_weight", pricing.placeholder_weight),
        ("pricing.placeholder_dimension", pricing.placeholder_dimension),
        ("pricing.max_weight_lb", pricing.limits.max_weight_lb),
        ("pricing.max_length_in", pricing.limits.max_length_in),
        ("pricing.max_length_girth_in", pricing.limits.max_length_girth_in),
    ];
    for (key, value) in positive {
        if value <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!("{key} must be greater than zero")));
        }
    }

    if pricing.default_fuel_rate_pct < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.default_fuel_rate_pct must not be negative".to_string(),
        ));
    }

    if pricing.minimum_fuel_fee.is_some_and(|fee| fee < Decimal::ZERO) {
        return Err(ConfigError::Validation(
            "pricing.minimum_fuel_fee must not be negative".to_string(),
        ));
    }

    if pricing.default_zone.0 == 0 {
        return Err(ConfigError::Validation(
            "pricing.default_zone must be a positive zone number".to_string(),
        ));
    }

    Ok(())
}

fn validate_batch(batch: &BatchConfig) -> Result<(), ConfigError> {
    if batch.workers == 0 || batch.workers > 256 {
        return Err(ConfigError::Validation("batch.workers must be in range 1..=256".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Accepts `3`, `zone3` or `ZONE3`.
fn parse_zone(key: &str, value: &str) -> Result<ZoneId, ConfigError> {
    let trimmed = value.trim();
    let digits = trimmed
        .get(..4)
        .filter(|prefix| prefix.eq_ignore_ascii_case("zone"))
        .map_or(trimmed, |_| &trimmed[4..]);
    digits
        .parse::<u32>()
        .map(ZoneId)
        .map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value: value.to_string() })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    pricing: Option<PricingPatch>,
    cache: Option<CachePatch>,
    batch: Option<BatchPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    default_zone: Option<String>,
    default_fuel_rate_pct: Option<String>,
    minimum_fuel_fee: Option<String>,
    default_dim_divisor_metric: Option<String>,
    default_dim_divisor_imperial: Option<String>,
    strict_input: Option<bool>,
    placeholder_weight: Option<String>,
    placeholder_dimension: Option<String>,
    max_weight_lb: Option<String>,
    max_length_in: Option<String>,
    max_length_girth_in: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    zone_ttl_secs: Option<u64>,
    fuel_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchPatch {
    workers: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
