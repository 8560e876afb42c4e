//! PostgreSQL catalog over the `products` table.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{FarmerId, ProductId};
use domain::Money;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::catalog::{Catalog, CatalogError, ProductSnapshot, StockLine, merge_lines};

/// Catalog backed by the `products` table.
///
/// A batch decrement locks its rows in id order with `SELECT ... FOR UPDATE`,
/// checks every line, then updates them in the same transaction.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a product or overwrites its row.
    pub async fn upsert_product(&self, product: &ProductSnapshot) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_minor, quantity, farmer_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                price_minor = EXCLUDED.price_minor,
                quantity = EXCLUDED.quantity,
                farmer_id = EXCLUDED.farmer_id
            "#,
        )
        .bind(product.product_id.as_uuid())
        .bind(&product.name)
        .bind(product.price.minor())
        .bind(to_db_quantity(product.available))
        .bind(product.farmer_id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<ProductSnapshot, CatalogError> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(ProductSnapshot {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price: Money::from_minor(row.try_get("price_minor")?),
            available: u32::try_from(quantity).unwrap_or(0),
            farmer_id: FarmerId::from_uuid(row.try_get::<Uuid, _>("farmer_id")?),
        })
    }
}

fn to_db_quantity(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}

#[async_trait]
impl Catalog for PostgresCatalog {
    async fn get_product(
        &self,
        product_id: ProductId,
    ) -> Result<Option<ProductSnapshot>, CatalogError> {
        let row = sqlx::query(
            "SELECT id, name, price_minor, quantity, farmer_id FROM products WHERE id = $1",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn decrement_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CatalogError> {
        self.decrement_stock_batch(&[StockLine::new(product_id, quantity)])
            .await
    }

    async fn decrement_stock_batch(&self, lines: &[StockLine]) -> Result<(), CatalogError> {
        let merged = merge_lines(lines);
        if merged.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = merged.iter().map(|l| l.product_id.as_uuid()).collect();
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "SELECT id, quantity FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let mut stock: HashMap<Uuid, i32> = HashMap::with_capacity(rows.len());
        for row in rows {
            stock.insert(row.try_get("id")?, row.try_get("quantity")?);
        }

        for line in &merged {
            let Some(&available) = stock.get(&line.product_id.as_uuid()) else {
                return Err(CatalogError::ProductNotFound(line.product_id));
            };
            if available < to_db_quantity(line.quantity) {
                return Err(CatalogError::InsufficientStock {
                    product_id: line.product_id,
                    available: u32::try_from(available).unwrap_or(0),
                    requested: line.quantity,
                });
            }
        }

        for line in &merged {
            sqlx::query(
                "UPDATE products SET quantity = quantity - $2 WHERE id = $1 AND quantity >= $2",
            )
            .bind(line.product_id.as_uuid())
            .bind(to_db_quantity(line.quantity))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(lines = merged.len(), "stock decremented");
        Ok(())
    }

    async fn restock_batch(&self, lines: &[StockLine]) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;
        for line in merge_lines(lines) {
            sqlx::query("UPDATE products SET quantity = quantity + $2 WHERE id = $1")
                .bind(line.product_id.as_uuid())
                .bind(to_db_quantity(line.quantity))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
