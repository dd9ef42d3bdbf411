use async_trait::async_trait;
use sqlx::Row;
use tracing::debug;

use freightrate_core::freight::sources::{SourceError, ZoneRepository};
use freightrate_core::freight::zone::{ZoneRule, ZoneTable};

use super::RepositoryError;
use crate::DbPool;

/// Zone chart stored as ordered pattern rows. Lookups load the chart and
/// apply the engine's most-specific-match rule; the resolver in front of
/// this repository caches the answers.
pub struct SqlZoneRepository {
    pool: DbPool,
}

impl SqlZoneRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn load_table(&self) -> Result<ZoneTable, RepositoryError> {
        let rows = sqlx::query(
            "SELECT origin_pattern, destination_pattern, zone_label
             FROM zone_rule
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let rules = rows
            .iter()
            .map(|row| {
                Ok(ZoneRule {
                    origin: row.try_get("origin_pattern")?,
                    destination: row.try_get("destination_pattern")?,
                    zone: row.try_get("zone_label")?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(ZoneTable::new(rules))
    }

    pub async fn replace(&self, rules: &[ZoneRule]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM zone_rule").execute(&mut *tx).await?;
        for rule in rules {
            sqlx::query(
                "INSERT INTO zone_rule (origin_pattern, destination_pattern, zone_label)
                 VALUES (?1, ?2, ?3)",
            )
            .bind(&rule.origin)
            .bind(&rule.destination)
            .bind(&rule.zone)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ZoneRepository for SqlZoneRepository {
    async fn resolve(&self, origin: &str, destination: &str) -> Result<Option<String>, SourceError> {
        let table = self.load_table().await?;
        let zone = table.lookup(origin, destination).map(str::to_string);
        debug!(
            event_name = "freight.zone.chart_lookup",
            origin,
            destination,
            rules = table.rules().len(),
            matched = zone.is_some(),
            "zone chart consulted"
        );
        Ok(zone)
    }
}
