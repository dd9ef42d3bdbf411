use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::{connect_with_settings, migrations::MIGRATOR};

    const CATALOG_TABLES: &[&str] =
        &["product", "weight_band", "zone_rule", "fuel_rate", "surcharge", "seasonal_surcharge"];

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "product",
        "weight_band",
        "zone_rule",
        "fuel_rate",
        "surcharge",
        "seasonal_surcharge",
        "idx_weight_band_product_id",
        "idx_fuel_rate_provider",
        "idx_surcharge_product_id",
        "idx_seasonal_surcharge_product_id",
    ];

    async fn table_count(pool: &sqlx::SqlitePool, table: &str) -> i64 {
        sqlx::query("SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(table)
            .fetch_one(pool)
            .await
            .expect("check table")
            .get::<i64, _>("count")
    }

    #[tokio::test]
    async fn migrations_create_catalog_tables() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        for table in CATALOG_TABLES {
            assert_eq!(table_count(&pool, table).await, 1, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn migrations_are_reversible() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        for table in CATALOG_TABLES {
            assert_eq!(table_count(&pool, table).await, 0, "table {table} survived undo");
        }
    }

    #[tokio::test]
    async fn migrations_up_down_up_preserves_schema_signature() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let initial_signature = managed_schema_signature(&pool).await;
        assert_eq!(
            initial_signature.len(),
            MANAGED_SCHEMA_OBJECTS.len(),
            "initial migration pass should create all managed schema objects",
        );

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");
        assert!(
            managed_schema_signature(&pool).await.is_empty(),
            "managed schema objects should be removed after full undo",
        );

        run_pending(&pool).await.expect("re-run migrations");
        assert_eq!(
            managed_schema_signature(&pool).await,
            initial_signature,
            "up/down/up should preserve migration-managed schema signature",
        );
    }

    #[tokio::test]
    async fn deleting_a_product_cascades_to_its_rates() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        sqlx::query(
            "INSERT INTO product (id, name, provider, weight_unit, dimension_unit, effective_date)
             VALUES ('ground', 'Ground', 'acme', 'KG', 'CM', '2025-01-01')",
        )
        .execute(&pool)
        .await
        .expect("insert product");
        sqlx::query(
            "INSERT INTO weight_band (product_id, weight, weight_unit, pricing_mode)
             VALUES ('ground', '1', 'KG', 'STEP')",
        )
        .execute(&pool)
        .await
        .expect("insert band");

        sqlx::query("DELETE FROM product WHERE id = 'ground'")
            .execute(&pool)
            .await
            .expect("delete product");

        let bands: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weight_band")
            .fetch_one(&pool)
            .await
            .expect("count bands");
        assert_eq!(bands, 0);
    }

    async fn managed_schema_signature(pool: &sqlx::SqlitePool) -> Vec<(String, String, String)> {
        let mut signature: Vec<(String, String, String)> = sqlx::query(
            "SELECT type, name, IFNULL(sql, '') AS sql
             FROM sqlite_master
             WHERE type IN ('table', 'index')",
        )
        .fetch_all(pool)
        .await
        .expect("load schema objects")
        .into_iter()
        .filter_map(|row| {
            let name = row.get::<String, _>("name");
            if MANAGED_SCHEMA_OBJECTS.contains(&name.as_str()) {
                Some((row.get::<String, _>("type"), name, row.get::<String, _>("sql")))
            } else {
                None
            }
        })
        .collect();
        signature.sort();
        signature
    }
}
