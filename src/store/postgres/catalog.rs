use async_trait::async_trait;
use uuid::Uuid;

use super::{insert_error, PgStore, ProductRow};
use crate::domain::aggregates::Product;
use crate::store::{CatalogRepository, Page, Result, StoreError};

#[async_trait]
impl CatalogRepository for PgStore {
    async fn create_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, name, description, category, brand, stock, price, created_at, created_by, updated_at, updated_by, deleted_at, deleted_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(product.id).bind(&product.name).bind(&product.description).bind(&product.category).bind(&product.brand)
        .bind(product.stock).bind(product.price)
        .bind(product.audit.created.at).bind(product.audit.created.by)
        .bind(product.audit.updated.map(|s| s.at)).bind(product.audit.updated.map(|s| s.by))
        .bind(product.deleted.map(|s| s.at)).bind(product.deleted.map(|s| s.by))
        .execute(&self.pool)
        .await
        .map_err(insert_error(format!("product {}", product.id)))?;
        Ok(())
    }

    async fn product_exists(&self, id: Uuid) -> Result<bool> {
        Ok(sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id).fetch_one(&self.pool).await?)
    }

    async fn resolve_product_by_id(&self, id: Uuid) -> Result<Product> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Product::from)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))
    }

    async fn resolve_all_products(&self, page: Page) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE deleted_at IS NULL ORDER BY name ASC, id ASC LIMIT $1 OFFSET $2")
            .bind(i64::from(page.limit)).bind(page.offset() as i64)
            .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
