use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use super::cache::ReadThroughCache;
use super::sources::FuelRateRepository;
use crate::domain::fuel::FuelRate;
use crate::domain::result::FuelRateSource;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuelRateResolution {
    pub rate_pct: Decimal,
    pub source: FuelRateSource,
    pub fuel_rate_id: Option<String>,
}

/// Picks the row covering `date` with the latest effective date. Rows sharing
/// an effective date are ordered by `created_at`, then by position.
pub fn select_fuel_rate(rows: &[FuelRate], date: NaiveDate) -> Option<&FuelRate> {
    rows.iter()
        .filter(|row| row.covers(date))
        .fold(None, |best: Option<&FuelRate>, row| match best {
            Some(current)
                if (current.effective_date, current.created_at)
                    > (row.effective_date, row.created_at) =>
            {
                Some(current)
            }
            _ => Some(row),
        })
}

/// Date-scoped fuel rates per provider, cached per provider.
pub struct FuelRateResolver {
    repository: Arc<dyn FuelRateRepository>,
    cache: ReadThroughCache<String, Vec<FuelRate>>,
    default_rate_pct: Decimal,
}

impl FuelRateResolver {
    pub fn new(
        repository: Arc<dyn FuelRateRepository>,
        default_rate_pct: Decimal,
        ttl: Option<Duration>,
    ) -> Self {
        Self { repository, cache: ReadThroughCache::new("fuel_rate", ttl), default_rate_pct }
    }

    pub async fn resolve(&self, provider: &str, date: NaiveDate) -> FuelRateResolution {
        let repository = self.repository.clone();
        let owned_provider = provider.to_string();
        let rows = self
            .cache
            .get_or_try_populate(provider.to_string(), || async move {
                repository.list(&owned_provider).await
            })
            .await;

        match rows {
            Ok(rows) => {
                if let Some(row) = select_fuel_rate(&rows, date) {
                    return FuelRateResolution {
                        rate_pct: row.rate_pct,
                        source: FuelRateSource::Configured,
                        fuel_rate_id: Some(row.id.clone()),
                    };
                }
                warn!(
                    event_name = "freight.fuel.defaulted",
                    provider = %provider,
                    date = %date,
                    default_rate_pct = %self.default_rate_pct,
                    "no fuel rate covers the calculation date; using default rate"
                );
            }
            Err(error) => {
                warn!(
                    event_name = "freight.fuel.defaulted",
                    provider = %provider,
                    date = %date,
                    error = %error,
                    default_rate_pct = %self.default_rate_pct,
                    "fuel rates unavailable; using default rate"
                );
            }
        }

        FuelRateResolution {
            rate_pct: self.default_rate_pct,
            source: FuelRateSource::Default,
            fuel_rate_id: None,
        }
    }

    pub async fn invalidate(&self, provider: &str) {
        self.cache.invalidate(&provider.to_string()).await;
    }

    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all().await;
    }
}
