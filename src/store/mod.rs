//! Storage traits and implementations.
//!
//! Services depend on the traits only. [`PgStore`] persists to Postgres; [`MemoryStore`]
//! keeps everything in process for tests and local runs.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, CartItem, CartLine, Order, Product};

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: Uuid },

    #[error("stored row could not be decoded: {0}")]
    Decode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Zero-based page of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const MAX_LIMIT: u32 = 100;

    pub fn offset(&self) -> u64 { u64::from(self.page) * u64::from(self.limit) }
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_product(&self, product: &Product) -> Result<()>;
    async fn product_exists(&self, id: Uuid) -> Result<bool>;
    async fn resolve_product_by_id(&self, id: Uuid) -> Result<Product>;
    /// Products ordered by name.
    async fn resolve_all_products(&self, page: Page) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn create_cart(&self, cart: &Cart) -> Result<()>;
    /// Persists the cart's audit and deletion fields.
    async fn update_cart(&self, cart: &Cart) -> Result<()>;
    async fn cart_exists(&self, id: Uuid) -> Result<bool>;
    async fn resolve_cart_by_id(&self, id: Uuid) -> Result<Cart>;
    async fn resolve_cart_by_user_id(&self, user_id: Uuid) -> Result<Option<Cart>>;
    async fn resolve_cart_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>>;
    async fn create_cart_item(&self, item: &CartItem) -> Result<()>;
    async fn update_cart_item(&self, item: &CartItem) -> Result<()>;
    /// Every line of the cart, priced at the product's current price.
    async fn resolve_cart_items_join_product(&self, cart_id: Uuid) -> Result<Vec<CartItem>>;
    /// One line with the product's current price and stock.
    async fn resolve_cart_item_join_product(&self, cart_id: Uuid, product_id: Uuid) -> Result<Option<CartLine>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Orders newest first with their items attached. `None` lists every user's orders.
    async fn resolve_orders(&self, user_id: Option<Uuid>, page: Page) -> Result<Vec<Order>>;
    /// Inserts the order and its items, decrements stock for each item and deletes the
    /// purchased lines from `cart_id`, as one transaction. Stock that would go negative
    /// fails with [`StoreError::InsufficientStock`] and nothing is written.
    async fn place_order(&self, order: &Order, cart_id: Uuid) -> Result<()>;
}
