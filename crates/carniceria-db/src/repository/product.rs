//! # Product Repository
//!
//! Catalog Store: create, read, update and delete products.
//!
//! ## Partial Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PUT /admin/productos/7   {"precio": 12.5}                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductPatch { price: Some(1250), name: None, cut: None, unit: None }  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET                                                    │
//! │      name        = COALESCE(NULL, name),         ← unchanged            │
//! │      cut         = COALESCE(NULL, cut),          ← unchanged            │
//! │      price_cents = COALESCE(1250, price_cents),  ← written              │
//! │      unit        = COALESCE(NULL, unit)          ← unchanged            │
//! │  WHERE id = 7                                                           │
//! │                                                                         │
//! │  The column list is fixed; request keys never reach the SQL text.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use carniceria_core::{NewProduct, Product, ProductPatch};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products, ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, cut, price_cents, unit
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by id.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product found
    /// * `Err(DbError::NotFound)` - No such product
    pub async fn get(&self, id: i64) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, cut, price_cents, unit
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Inserts a validated product and returns its id.
    pub async fn create(&self, product: &NewProduct) -> DbResult<i64> {
        debug!(name = %product.name, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, cut, price_cents, unit)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&product.name)
        .bind(&product.cut)
        .bind(product.price)
        .bind(&product.unit)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Applies the fields present in `patch` and returns the updated product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No row matched `id`
    pub async fn update(&self, id: i64, patch: &ProductPatch) -> DbResult<Product> {
        debug!(id, ?patch, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                cut = COALESCE(?3, cut),
                price_cents = COALESCE(?4, price_cents),
                unit = COALESCE(?5, unit)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.cut.as_deref())
        .bind(patch.price)
        .bind(patch.unit.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Deletes a product. Order lines that reference it keep the dangling id.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
