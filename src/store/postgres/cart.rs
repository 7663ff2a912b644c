use async_trait::async_trait;
use uuid::Uuid;

use super::{insert_error, CartItemRow, CartLineRow, CartRow, PgStore};
use crate::domain::aggregates::{Cart, CartItem, CartLine};
use crate::store::{CartRepository, Result, StoreError};

const SELECT_ITEMS_JOIN_PRODUCT: &str = "SELECT ci.cart_id, ci.product_id, ci.quantity, p.price AS unit_price, \
     ci.created_at, ci.created_by, ci.updated_at, ci.updated_by, ci.deleted_at, ci.deleted_by \
     FROM cart_items ci JOIN products p ON ci.product_id = p.id \
     WHERE ci.cart_id = $1 AND p.deleted_at IS NULL ORDER BY ci.created_at, ci.product_id";

#[async_trait]
impl CartRepository for PgStore {
    async fn create_cart(&self, cart: &Cart) -> Result<()> {
        let audit = cart.audit();
        sqlx::query(
            "INSERT INTO carts (id, user_id, created_at, created_by, updated_at, updated_by, deleted_at, deleted_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(cart.id()).bind(cart.user_id())
        .bind(audit.created.at).bind(audit.created.by)
        .bind(audit.updated.map(|s| s.at)).bind(audit.updated.map(|s| s.by))
        .bind(cart.deleted().map(|s| s.at)).bind(cart.deleted().map(|s| s.by))
        .execute(&self.pool)
        .await
        .map_err(insert_error(format!("cart {}", cart.id())))?;
        Ok(())
    }

    async fn update_cart(&self, cart: &Cart) -> Result<()> {
        let audit = cart.audit();
        let done = sqlx::query(
            "UPDATE carts SET updated_at = $2, updated_by = $3, deleted_at = $4, deleted_by = $5 WHERE id = $1",
        )
        .bind(cart.id())
        .bind(audit.updated.map(|s| s.at)).bind(audit.updated.map(|s| s.by))
        .bind(cart.deleted().map(|s| s.at)).bind(cart.deleted().map(|s| s.by))
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("cart {}", cart.id())));
        }
        Ok(())
    }

    async fn cart_exists(&self, id: Uuid) -> Result<bool> {
        Ok(sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM carts WHERE id = $1 AND deleted_at IS NULL)")
            .bind(id).fetch_one(&self.pool).await?)
    }

    async fn resolve_cart_by_id(&self, id: Uuid) -> Result<Cart> {
        sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE id = $1 AND deleted_at IS NULL")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Cart::from)
            .ok_or_else(|| StoreError::NotFound(format!("cart {id}")))
    }

    async fn resolve_cart_by_user_id(&self, user_id: Uuid) -> Result<Option<Cart>> {
        Ok(sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE user_id = $1 AND deleted_at IS NULL")
            .bind(user_id).fetch_optional(&self.pool).await?
            .map(Cart::from))
    }

    async fn resolve_cart_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>> {
        sqlx::query_as::<_, CartItemRow>("SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id).bind(product_id).fetch_optional(&self.pool).await?
            .map(CartItem::try_from)
            .transpose()
    }

    async fn create_cart_item(&self, item: &CartItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity, unit_price, created_at, created_by, updated_at, updated_by, deleted_at, deleted_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(item.cart_id).bind(item.product_id).bind(item.quantity).bind(item.unit_price)
        .bind(item.audit.created.at).bind(item.audit.created.by)
        .bind(item.audit.updated.map(|s| s.at)).bind(item.audit.updated.map(|s| s.by))
        .bind(item.deleted.map(|s| s.at)).bind(item.deleted.map(|s| s.by))
        .execute(&self.pool)
        .await
        .map_err(insert_error(format!("cart item {}/{}", item.cart_id, item.product_id)))?;
        Ok(())
    }

    async fn update_cart_item(&self, item: &CartItem) -> Result<()> {
        let done = sqlx::query(
            "UPDATE cart_items SET quantity = $3, unit_price = $4, updated_at = $5, updated_by = $6 \
             WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(item.cart_id).bind(item.product_id).bind(item.quantity).bind(item.unit_price)
        .bind(item.audit.updated.map(|s| s.at)).bind(item.audit.updated.map(|s| s.by))
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("cart item {}/{}", item.cart_id, item.product_id)));
        }
        Ok(())
    }

    async fn resolve_cart_items_join_product(&self, cart_id: Uuid) -> Result<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartItemRow>(SELECT_ITEMS_JOIN_PRODUCT)
            .bind(cart_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(CartItem::try_from).collect()
    }

    async fn resolve_cart_item_join_product(&self, cart_id: Uuid, product_id: Uuid) -> Result<Option<CartLine>> {
        Ok(sqlx::query_as::<_, CartLineRow>(
            "SELECT ci.cart_id, ci.product_id, ci.quantity, p.price AS unit_price, p.stock \
             FROM cart_items ci JOIN products p ON ci.product_id = p.id \
             WHERE ci.cart_id = $1 AND ci.product_id = $2 AND p.deleted_at IS NULL",
        )
        .bind(cart_id).bind(product_id)
        .fetch_optional(&self.pool).await?
        .map(CartLine::from))
    }
}
