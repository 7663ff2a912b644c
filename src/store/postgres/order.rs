use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::{debug, error};
use uuid::Uuid;

use super::{insert_error, OrderItemRow, OrderRow, PgStore};
use crate::domain::aggregates::{Order, OrderItem};
use crate::store::{OrderRepository, Page, Result, StoreError};

#[async_trait]
impl OrderRepository for PgStore {
    async fn resolve_orders(&self, user_id: Option<Uuid>, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id).bind(i64::from(page.limit)).bind(page.offset() as i64)
        .fetch_all(&self.pool).await?;
        let mut orders = rows.into_iter().map(Order::try_from).collect::<Result<Vec<_>>>()?;

        let ids: Vec<Uuid> = orders.iter().map(Order::id).collect();
        let items: Vec<OrderItem> = sqlx::query_as::<_, OrderItemRow>("SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY created_at")
            .bind(ids).fetch_all(&self.pool).await?
            .into_iter().map(OrderItem::try_from).collect::<Result<_>>()?;

        for order in &mut orders {
            let id = order.id();
            order.attach_items(items.iter().filter(|i| i.order_id == id).cloned()).recalculate()
                .map_err(|e| StoreError::Decode(format!("order {id}: {e}")))?;
        }
        Ok(orders)
    }

    async fn place_order(&self, order: &Order, cart_id: Uuid) -> Result<()> {
        // Rows are locked in product id order so concurrent checkouts cannot deadlock.
        let mut items: Vec<&OrderItem> = order.items().iter().collect();
        items.sort_by_key(|i| i.product_id);
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();

        // Dropping `tx` on an early return rolls everything back.
        let mut tx = self.pool.begin().await?;
        lock_products(&mut tx, &product_ids).await?;
        insert_order(&mut tx, order).await?;
        for item in items {
            insert_order_item(&mut tx, item).await?;
            decrement_stock(&mut tx, item.product_id, item.quantity).await?;
            delete_cart_item(&mut tx, cart_id, item.product_id).await?;
        }
        tx.commit().await.map_err(|e| {
            error!(order_id = %order.id(), "commit failed: {e}");
            StoreError::Database(e)
        })?;
        debug!(order_id = %order.id(), items = order.items().len(), "order committed");
        Ok(())
    }
}

async fn lock_products(conn: &mut PgConnection, product_ids: &[Uuid]) -> Result<()> {
    sqlx::query("SELECT id FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(product_ids)
        .fetch_all(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<()> {
    let audit = order.audit();
    sqlx::query(
        "INSERT INTO orders (id, user_id, address, status, created_at, created_by, updated_at, updated_by, deleted_at, deleted_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(order.id()).bind(order.user_id()).bind(order.address()).bind(order.status().as_str())
    .bind(audit.created.at).bind(audit.created.by)
    .bind(audit.updated.map(|s| s.at)).bind(audit.updated.map(|s| s.by))
    .bind(order.deleted().map(|s| s.at)).bind(order.deleted().map(|s| s.by))
    .execute(&mut *conn)
    .await
    .map_err(insert_error(format!("order {}", order.id())))?;
    Ok(())
}

async fn insert_order_item(conn: &mut PgConnection, item: &OrderItem) -> Result<()> {
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price, created_at, created_by, updated_at, updated_by, deleted_at, deleted_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(item.order_id).bind(item.product_id).bind(item.quantity).bind(item.unit_price)
    .bind(item.audit.created.at).bind(item.audit.created.by)
    .bind(item.audit.updated.map(|s| s.at)).bind(item.audit.updated.map(|s| s.by))
    .bind(item.deleted.map(|s| s.at)).bind(item.deleted.map(|s| s.by))
    .execute(&mut *conn)
    .await
    .map_err(insert_error(format!("order item {}/{}", item.order_id, item.product_id)))?;
    Ok(())
}

/// Stock only moves when enough is left.
async fn decrement_stock(conn: &mut PgConnection, product_id: Uuid, quantity: i32) -> Result<()> {
    let done = sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
        .bind(product_id).bind(quantity)
        .execute(&mut *conn)
        .await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::InsufficientStock { product_id });
    }
    Ok(())
}

async fn delete_cart_item(conn: &mut PgConnection, cart_id: Uuid, product_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id).bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
