use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use freightrate_core::domain::fuel::FuelRate;
use freightrate_core::freight::sources::{FuelRateRepository, SourceError};

use super::{
    decode_date, decode_decimal, decode_optional_date, decode_timestamp, encode_date,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlFuelRateRepository {
    pool: DbPool,
}

impl SqlFuelRateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_provider(&self, provider: &str) -> Result<Vec<FuelRate>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, provider, rate_pct, effective_date, expiration_date, created_at
             FROM fuel_rate
             WHERE provider = ?1
             ORDER BY effective_date ASC, created_at ASC, id ASC",
        )
        .bind(provider)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(fuel_rate_from_row).collect()
    }

    pub async fn save(&self, rate: &FuelRate) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT OR REPLACE INTO fuel_rate (
                id, provider, rate_pct, effective_date, expiration_date, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&rate.id)
        .bind(&rate.provider)
        .bind(rate.rate_pct.to_string())
        .bind(encode_date(rate.effective_date))
        .bind(rate.expiration_date.map(encode_date))
        .bind(rate.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl FuelRateRepository for SqlFuelRateRepository {
    async fn list(&self, provider: &str) -> Result<Vec<FuelRate>, SourceError> {
        Ok(self.list_for_provider(provider).await?)
    }
}

fn fuel_rate_from_row(row: &SqliteRow) -> Result<FuelRate, RepositoryError> {
    let rate_pct: String = row.try_get("rate_pct")?;
    let effective_date: String = row.try_get("effective_date")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(FuelRate {
        id: row.try_get("id")?,
        provider: row.try_get("provider")?,
        rate_pct: decode_decimal("rate_pct", &rate_pct)?,
        effective_date: decode_date("effective_date", &effective_date)?,
        expiration_date: decode_optional_date("expiration_date", row.try_get("expiration_date")?)?,
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}
