//! PostgreSQL store.
//!
//! Queries go through `sqlx::query_as` with row structs mapped onto the aggregates.
//! Schema lives in `migrations/`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Result, StoreError};
use crate::domain::aggregates::{Cart, CartItem, CartLine, Order, OrderItem, Product};
use crate::domain::value_objects::{Audit, Stamp};

mod cart;
mod catalog;
mod order;

/// Postgres implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        Ok(Self::new(pool))
    }
}

/// Maps a unique-key violation on insert to `Conflict`.
fn insert_error(entity: String) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        let duplicate = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
        if duplicate { StoreError::Conflict(entity) } else { StoreError::Database(err) }
    }
}

fn audit(created_at: DateTime<Utc>, created_by: Uuid, updated_at: Option<DateTime<Utc>>, updated_by: Option<Uuid>) -> Audit {
    Audit { created: Stamp { at: created_at, by: created_by }, updated: Stamp::from_columns(updated_at, updated_by) }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    category: String,
    brand: String,
    stock: i32,
    price: Decimal,
    created_at: DateTime<Utc>,
    created_by: Uuid,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id, name: r.name, description: r.description, category: r.category, brand: r.brand,
            stock: r.stock, price: r.price,
            audit: audit(r.created_at, r.created_by, r.updated_at, r.updated_by),
            deleted: Stamp::from_columns(r.deleted_at, r.deleted_by),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    created_by: Uuid,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Cart::restore(
            r.id, r.user_id,
            audit(r.created_at, r.created_by, r.updated_at, r.updated_by),
            Stamp::from_columns(r.deleted_at, r.deleted_by),
        )
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    created_at: DateTime<Utc>,
    created_by: Uuid,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = StoreError;
    fn try_from(r: CartItemRow) -> Result<Self> {
        let mut item = CartItem {
            cart_id: r.cart_id, product_id: r.product_id, quantity: r.quantity, unit_price: r.unit_price,
            total_price: Decimal::ZERO,
            audit: audit(r.created_at, r.created_by, r.updated_at, r.updated_by),
            deleted: Stamp::from_columns(r.deleted_at, r.deleted_by),
        };
        item.recalculate().map_err(|e| StoreError::Decode(format!("line {}/{}: {e}", r.cart_id, r.product_id)))?;
        Ok(item)
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    stock: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(r: CartLineRow) -> Self {
        CartLine { cart_id: r.cart_id, product_id: r.product_id, quantity: r.quantity, unit_price: r.unit_price, stock: r.stock }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    address: String,
    status: String,
    created_at: DateTime<Utc>,
    created_by: Uuid,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;
    fn try_from(r: OrderRow) -> Result<Self> {
        let status = r.status.parse().map_err(|e| StoreError::Decode(format!("order {}: {e}", r.id)))?;
        Ok(Order::restore(
            r.id, r.user_id, r.address, status,
            audit(r.created_at, r.created_by, r.updated_at, r.updated_by),
            Stamp::from_columns(r.deleted_at, r.deleted_by),
        ))
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    created_at: DateTime<Utc>,
    created_by: Uuid,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;
    fn try_from(r: OrderItemRow) -> Result<Self> {
        let mut item = OrderItem {
            order_id: r.order_id, product_id: r.product_id, quantity: r.quantity, unit_price: r.unit_price,
            total_price: Decimal::ZERO,
            audit: audit(r.created_at, r.created_by, r.updated_at, r.updated_by),
            deleted: Stamp::from_columns(r.deleted_at, r.deleted_by),
        };
        item.recalculate().map_err(|e| StoreError::Decode(format!("line {}/{}: {e}", r.order_id, r.product_id)))?;
        Ok(item)
    }
}
