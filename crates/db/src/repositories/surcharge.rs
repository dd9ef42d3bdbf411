use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use freightrate_core::domain::product::ProductId;
use freightrate_core::domain::surcharge::{SeasonalSurcharge, Surcharge};
use freightrate_core::freight::sources::{
    SeasonalSurchargeRepository, SourceError, SurchargeRepository,
};

use super::{
    decode_date, decode_decimal, decode_price_map, encode_date, encode_price_map, RepositoryError,
};
use crate::DbPool;

pub struct SqlSurchargeRepository {
    pool: DbPool,
}

impl SqlSurchargeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Surcharge>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, surcharge_type, sub_type, name, condition_expr, fees_json, display_order
             FROM surcharge
             WHERE product_id = ?1
             ORDER BY display_order ASC, id ASC",
        )
        .bind(&product_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(surcharge_from_row).collect()
    }

    pub async fn save(
        &self,
        product_id: &ProductId,
        surcharge: &Surcharge,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT OR REPLACE INTO surcharge (
                id, product_id, surcharge_type, sub_type, name, condition_expr, fees_json,
                display_order
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&surcharge.id)
        .bind(&product_id.0)
        .bind(&surcharge.surcharge_type)
        .bind(&surcharge.sub_type)
        .bind(&surcharge.name)
        .bind(&surcharge.condition)
        .bind(encode_price_map(&surcharge.fees)?)
        .bind(surcharge.display_order)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SurchargeRepository for SqlSurchargeRepository {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<Surcharge>, SourceError> {
        Ok(self.list_for_product(product_id).await?)
    }
}

fn surcharge_from_row(row: &SqliteRow) -> Result<Surcharge, RepositoryError> {
    let fees: String = row.try_get("fees_json")?;

    Ok(Surcharge {
        id: row.try_get("id")?,
        surcharge_type: row.try_get("surcharge_type")?,
        sub_type: row.try_get("sub_type")?,
        name: row.try_get("name")?,
        condition: row.try_get("condition_expr")?,
        fees: decode_price_map("fees_json", &fees)?,
        display_order: row.try_get("display_order")?,
    })
}

pub struct SqlSeasonalSurchargeRepository {
    pool: DbPool,
}

impl SqlSeasonalSurchargeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<SeasonalSurcharge>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, surcharge_type, name, start_date, end_date, fee
             FROM seasonal_surcharge
             WHERE product_id = ?1
             ORDER BY start_date ASC, id ASC",
        )
        .bind(&product_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(seasonal_from_row).collect()
    }

    pub async fn save(
        &self,
        product_id: &ProductId,
        surcharge: &SeasonalSurcharge,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT OR REPLACE INTO seasonal_surcharge (
                id, product_id, surcharge_type, name, start_date, end_date, fee
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&surcharge.id)
        .bind(&product_id.0)
        .bind(&surcharge.surcharge_type)
        .bind(&surcharge.name)
        .bind(encode_date(surcharge.start_date))
        .bind(encode_date(surcharge.end_date))
        .bind(surcharge.fee.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SeasonalSurchargeRepository for SqlSeasonalSurchargeRepository {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<SeasonalSurcharge>, SourceError> {
        Ok(self.list_for_product(product_id).await?)
    }
}

fn seasonal_from_row(row: &SqliteRow) -> Result<SeasonalSurcharge, RepositoryError> {
    let start_date: String = row.try_get("start_date")?;
    let end_date: String = row.try_get("end_date")?;
    let fee: String = row.try_get("fee")?;

    Ok(SeasonalSurcharge {
        id: row.try_get("id")?,
        surcharge_type: row.try_get("surcharge_type")?,
        name: row.try_get("name")?,
        start_date: decode_date("start_date", &start_date)?,
        end_date: decode_date("end_date", &end_date)?,
        fee: decode_decimal("fee", &fee)?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use freightrate_core::domain::product::{Product, ProductId};
    use freightrate_core::domain::surcharge::{SeasonalSurcharge, Surcharge};
    use freightrate_core::domain::units::{DimensionUnit, WeightUnit};
    use freightrate_core::freight::sources::{SeasonalSurchargeRepository, SurchargeRepository};

    use super::{SqlSeasonalSurchargeRepository, SqlSurchargeRepository};
    use crate::repositories::SqlProductRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    fn ground() -> ProductId {
        ProductId("ground".to_string())
    }

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlProductRepository::new(pool.clone())
            .save(&Product {
                id: ground(),
                name: "Ground".to_string(),
                provider: "acme".to_string(),
                currency: "USD".to_string(),
                weight_unit: WeightUnit::Kg,
                dimension_unit: DimensionUnit::Cm,
                dim_factor: None,
                effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"),
                expiration_date: None,
                active: true,
            })
            .await
            .expect("save product");
        pool
    }

    fn surcharge(id: &str, order: i32, fees: &[(&str, i64)]) -> Surcharge {
        Surcharge {
            id: id.to_string(),
            surcharge_type: "OVERSIZE".to_string(),
            sub_type: None,
            name: "Oversize".to_string(),
            condition: "length > 120".to_string(),
            fees: fees
                .iter()
                .map(|(key, fee)| (key.to_string(), Decimal::from(*fee)))
                .collect::<BTreeMap<_, _>>(),
            display_order: order,
        }
    }

    #[tokio::test]
    async fn surcharges_list_in_display_order() {
        let repository = SqlSurchargeRepository::new(pool().await);
        let mut unauthorized = surcharge("over-weight", 10, &[("default", 900)]);
        unauthorized.surcharge_type = "UNAUTHORIZED".to_string();
        unauthorized.sub_type = Some("OVERWEIGHT".to_string());

        repository.save(&ground(), &unauthorized).await.expect("save");
        repository
            .save(&ground(), &surcharge("oversize", 3, &[("Zone 1", 60), ("z2", 70)]))
            .await
            .expect("save");

        let listed = repository.list(&ground()).await.expect("list");
        let ids: Vec<_> = listed.iter().map(|surcharge| surcharge.id.as_str()).collect();
        assert_eq!(ids, vec!["oversize", "over-weight"]);
        assert_eq!(listed[0].fees.get("Zone 1"), Some(&Decimal::from(60)));
        assert_eq!(listed[1], unauthorized);
    }

    #[tokio::test]
    async fn seasonal_surcharges_round_trip() {
        let repository = SqlSeasonalSurchargeRepository::new(pool().await);
        let peak = SeasonalSurcharge {
            id: "peak-2025".to_string(),
            surcharge_type: "PEAK".to_string(),
            name: "Holiday peak".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 11, 15).expect("date"),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).expect("date"),
            fee: Decimal::new(395, 2),
        };
        repository.save(&ground(), &peak).await.expect("save");

        assert_eq!(repository.list(&ground()).await.expect("list"), vec![peak]);
    }

    #[tokio::test]
    async fn surcharges_require_a_known_product() {
        let repository = SqlSurchargeRepository::new(pool().await);
        let result = repository
            .save(&ProductId("missing".to_string()), &surcharge("oversize", 1, &[]))
            .await;

        assert!(result.is_err(), "foreign key should reject orphan surcharges");
    }
}
