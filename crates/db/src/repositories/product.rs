use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use freightrate_core::domain::product::{Product, ProductId};
use freightrate_core::domain::units::{DimensionUnit, WeightUnit};
use freightrate_core::freight::sources::{ProductRepository, SourceError};

use super::{
    decode_date, decode_optional_date, decode_optional_decimal, decode_unit, encode_date,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, provider, currency, weight_unit, dimension_unit, dim_factor,
                    effective_date, expiration_date, active
             FROM product
             WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| product_from_row(&row)).transpose()
    }

    /// Upserts in place so bands and surcharges owned by the product survive.
    pub async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (
                id, name, provider, currency, weight_unit, dimension_unit, dim_factor,
                effective_date, expiration_date, active
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                provider = excluded.provider,
                currency = excluded.currency,
                weight_unit = excluded.weight_unit,
                dimension_unit = excluded.dimension_unit,
                dim_factor = excluded.dim_factor,
                effective_date = excluded.effective_date,
                expiration_date = excluded.expiration_date,
                active = excluded.active",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.provider)
        .bind(&product.currency)
        .bind(product.weight_unit.to_string())
        .bind(product.dimension_unit.to_string())
        .bind(product.dim_factor.map(|factor| factor.to_string()))
        .bind(encode_date(product.effective_date))
        .bind(product.expiration_date.map(encode_date))
        .bind(product.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProductRepository for SqlProductRepository {
    async fn get(&self, product_id: &ProductId) -> Result<Option<Product>, SourceError> {
        Ok(self.find_by_id(product_id).await?)
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let weight_unit: String = row.try_get("weight_unit")?;
    let dimension_unit: String = row.try_get("dimension_unit")?;
    let effective_date: String = row.try_get("effective_date")?;

    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        provider: row.try_get("provider")?,
        currency: row.try_get("currency")?,
        weight_unit: decode_unit::<WeightUnit>("weight_unit", &weight_unit)?,
        dimension_unit: decode_unit::<DimensionUnit>("dimension_unit", &dimension_unit)?,
        dim_factor: decode_optional_decimal("dim_factor", row.try_get("dim_factor")?)?,
        effective_date: decode_date("effective_date", &effective_date)?,
        expiration_date: decode_optional_date("expiration_date", row.try_get("expiration_date")?)?,
        active: row.try_get("active")?,
    })
}
