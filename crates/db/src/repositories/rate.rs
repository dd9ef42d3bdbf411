use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use freightrate_core::domain::product::ProductId;
use freightrate_core::domain::rate::{PricingMode, RawWeightBand};
use freightrate_core::domain::units::WeightUnit;
use freightrate_core::freight::sources::{RateRepository, SourceError};

use super::{
    decode_decimal, decode_optional_decimal, decode_price_map, decode_unit, encode_price_map,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlRateRepository {
    pool: DbPool,
}

impl SqlRateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<RawWeightBand>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT weight, weight_unit, pricing_mode, reference_weight,
                    base_prices_json, unit_prices_json
             FROM weight_band
             WHERE product_id = ?1
             ORDER BY CAST(weight AS REAL) ASC, id ASC",
        )
        .bind(&product_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(band_from_row).collect()
    }

    pub async fn replace(
        &self,
        product_id: &ProductId,
        bands: &[RawWeightBand],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM weight_band WHERE product_id = ?1")
            .bind(&product_id.0)
            .execute(&mut *tx)
            .await?;

        for band in bands {
            sqlx::query(
                "INSERT INTO weight_band (
                    product_id, weight, weight_unit, pricing_mode, reference_weight,
                    base_prices_json, unit_prices_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&product_id.0)
            .bind(band.weight.to_string())
            .bind(band.weight_unit.to_string())
            .bind(mode_label(band.mode))
            .bind(band.reference_weight.map(|weight| weight.to_string()))
            .bind(encode_price_map(&band.base_prices)?)
            .bind(encode_price_map(&band.unit_prices)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl RateRepository for SqlRateRepository {
    async fn list_bands(&self, product_id: &ProductId) -> Result<Vec<RawWeightBand>, SourceError> {
        Ok(self.list_for_product(product_id).await?)
    }
}

fn mode_label(mode: PricingMode) -> &'static str {
    match mode {
        PricingMode::Step => "STEP",
        PricingMode::Linear => "LINEAR",
    }
}

fn parse_mode(raw: &str) -> Result<PricingMode, RepositoryError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "STEP" => Ok(PricingMode::Step),
        "LINEAR" => Ok(PricingMode::Linear),
        other => Err(RepositoryError::Decode(format!("unknown pricing_mode `{other}`"))),
    }
}

fn band_from_row(row: &SqliteRow) -> Result<RawWeightBand, RepositoryError> {
    let weight: String = row.try_get("weight")?;
    let weight_unit: String = row.try_get("weight_unit")?;
    let mode: String = row.try_get("pricing_mode")?;
    let base_prices: String = row.try_get("base_prices_json")?;
    let unit_prices: String = row.try_get("unit_prices_json")?;

    Ok(RawWeightBand {
        weight: decode_decimal("weight", &weight)?,
        weight_unit: decode_unit::<WeightUnit>("weight_unit", &weight_unit)?,
        mode: parse_mode(&mode)?,
        reference_weight: decode_optional_decimal(
            "reference_weight",
            row.try_get("reference_weight")?,
        )?,
        base_prices: decode_price_map("base_prices_json", &base_prices)?,
        unit_prices: decode_price_map("unit_prices_json", &unit_prices)?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use freightrate_core::domain::product::{Product, ProductId};
    use freightrate_core::domain::rate::{PricingMode, RawWeightBand};
    use freightrate_core::domain::units::{DimensionUnit, WeightUnit};
    use freightrate_core::freight::sources::RateRepository;

    use super::SqlRateRepository;
    use crate::repositories::SqlProductRepository;
    use crate::{connect_with_settings, migrations};

    fn ground() -> ProductId {
        ProductId("ground".to_string())
    }

    fn band(weight: i64, mode: PricingMode, prices: &[(&str, &str)]) -> RawWeightBand {
        RawWeightBand {
            weight: Decimal::from(weight),
            weight_unit: WeightUnit::Kg,
            mode,
            reference_weight: None,
            base_prices: prices
                .iter()
                .map(|(key, price)| (key.to_string(), price.parse().expect("decimal")))
                .collect(),
            unit_prices: BTreeMap::new(),
        }
    }

    async fn repository() -> SqlRateRepository {
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
        SqlRateRepository::new(pool)
    }

    #[tokio::test]
    async fn bands_come_back_sorted_with_legacy_keys_intact() {
        let repository = repository().await;
        let mut linear = band(30, PricingMode::Linear, &[("zone1", "30")]);
        linear.reference_weight = Some(Decimal::from(20));
        linear.unit_prices.insert("Zone 1".to_string(), Decimal::new(110, 2));

        repository
            .replace(
                &ground(),
                &[
                    band(5, PricingMode::Step, &[("ZONE_2", "13.50")]),
                    linear.clone(),
                    band(1, PricingMode::Step, &[("Zone 2", "9.25"), ("区3", "10.00")]),
                ],
            )
            .await
            .expect("replace");

        let bands = repository.list_bands(&ground()).await.expect("list");
        let weights: Vec<_> = bands.iter().map(|band| band.weight).collect();
        assert_eq!(weights, vec![Decimal::from(1), Decimal::from(5), Decimal::from(30)]);
        assert_eq!(bands[0].base_prices.get("区3"), Some(&Decimal::new(1000, 2)));
        assert_eq!(bands[2], linear);
    }

    #[tokio::test]
    async fn replace_discards_previous_bands() {
        let repository = repository().await;
        repository
            .replace(&ground(), &[band(1, PricingMode::Step, &[("zone1", "8")])])
            .await
            .expect("first");
        repository
            .replace(&ground(), &[band(2, PricingMode::Step, &[("zone1", "9")])])
            .await
            .expect("second");

        let bands = repository.list_bands(&ground()).await.expect("list");
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].weight, Decimal::from(2));
    }

    #[tokio::test]
    async fn product_without_bands_lists_nothing() {
        let repository = repository().await;
        assert!(repository.list_bands(&ground()).await.expect("list").is_empty());
    }
}
