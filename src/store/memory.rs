//! In-memory store for tests and database-less runs.
//!
//! `place_order` works on a copy of the state and swaps it in only when every step
//! succeeded, so a failure at any [`FailPoint`] leaves nothing behind.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CartRepository, CatalogRepository, OrderRepository, Page, Result, StoreError};
use crate::domain::aggregates::{Cart, CartItem, CartLine, Order, OrderItem, Product};

/// Step of `place_order` at which an injected failure fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    OrderInsert,
    OrderItemInsert,
    StockDecrement,
    CartItemDelete,
}

#[derive(Clone, Default)]
struct State {
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, Cart>,
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

fn trip(armed: Option<FailPoint>, at: FailPoint) -> Result<()> {
    if armed == Some(at) {
        return Err(StoreError::Unavailable(format!("injected failure at {at:?}")));
    }
    Ok(())
}

impl State {
    fn insert_order(&mut self, order: &Order, armed: Option<FailPoint>) -> Result<()> {
        trip(armed, FailPoint::OrderInsert)?;
        if self.orders.iter().any(|o| o.id() == order.id()) {
            return Err(StoreError::Conflict(format!("order {}", order.id())));
        }
        self.orders.push(Order::restore(
            order.id(), order.user_id(), order.address().to_string(), order.status(),
            *order.audit(), order.deleted().copied(),
        ));
        Ok(())
    }

    fn insert_order_item(&mut self, item: &OrderItem, armed: Option<FailPoint>) -> Result<()> {
        trip(armed, FailPoint::OrderItemInsert)?;
        if self.order_items.iter().any(|i| i.order_id == item.order_id && i.product_id == item.product_id) {
            return Err(StoreError::Conflict(format!("order item {}/{}", item.order_id, item.product_id)));
        }
        self.order_items.push(item.clone());
        Ok(())
    }

    fn decrement_stock(&mut self, product_id: Uuid, quantity: i32, armed: Option<FailPoint>) -> Result<()> {
        trip(armed, FailPoint::StockDecrement)?;
        match self.products.get_mut(&product_id) {
            Some(p) if p.stock >= quantity => {
                p.stock -= quantity;
                Ok(())
            }
            _ => Err(StoreError::InsufficientStock { product_id }),
        }
    }

    fn delete_cart_item(&mut self, cart_id: Uuid, product_id: Uuid, armed: Option<FailPoint>) -> Result<()> {
        trip(armed, FailPoint::CartItemDelete)?;
        self.cart_items.retain(|i| !(i.cart_id == cart_id && i.product_id == product_id));
        Ok(())
    }

    fn product_for(&self, item: &CartItem) -> Option<&Product> {
        self.products.get(&item.product_id).filter(|p| !p.is_deleted())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_point: RwLock<Option<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or with `None`, disarms) a failure inside `place_order`.
    pub async fn fail_at(&self, point: Option<FailPoint>) {
        *self.fail_point.write().await = point;
    }

    /// Stands in for the external inventory process.
    pub async fn set_stock(&self, product_id: Uuid, stock: i32) -> Result<()> {
        let mut state = self.state.write().await;
        let product = state.products.get_mut(&product_id).ok_or_else(|| StoreError::NotFound(format!("product {product_id}")))?;
        product.stock = stock;
        Ok(())
    }

    /// Stands in for a catalog price change.
    pub async fn set_price(&self, product_id: Uuid, price: rust_decimal::Decimal) -> Result<()> {
        let mut state = self.state.write().await;
        let product = state.products.get_mut(&product_id).ok_or_else(|| StoreError::NotFound(format!("product {product_id}")))?;
        product.price = price;
        Ok(())
    }

    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn create_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!("product {}", product.id)));
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn product_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.read().await.products.contains_key(&id))
    }

    async fn resolve_product_by_id(&self, id: Uuid) -> Result<Product> {
        self.state.read().await.products.get(&id).filter(|p| !p.is_deleted()).cloned()
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))
    }

    async fn resolve_all_products(&self, page: Page) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state.products.values().filter(|p| !p.is_deleted()).cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products.into_iter().skip(page.offset() as usize).take(page.limit as usize).collect())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn create_cart(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;
        if state.carts.contains_key(&cart.id()) {
            return Err(StoreError::Conflict(format!("cart {}", cart.id())));
        }
        state.carts.insert(cart.id(), Cart::restore(cart.id(), cart.user_id(), *cart.audit(), cart.deleted().copied()));
        Ok(())
    }

    async fn update_cart(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state.carts.get_mut(&cart.id()).ok_or_else(|| StoreError::NotFound(format!("cart {}", cart.id())))?;
        *stored = Cart::restore(cart.id(), cart.user_id(), *cart.audit(), cart.deleted().copied());
        Ok(())
    }

    async fn cart_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.read().await.carts.get(&id).is_some_and(|c| !c.is_deleted()))
    }

    async fn resolve_cart_by_id(&self, id: Uuid) -> Result<Cart> {
        self.state.read().await.carts.get(&id).filter(|c| !c.is_deleted()).cloned()
            .ok_or_else(|| StoreError::NotFound(format!("cart {id}")))
    }

    async fn resolve_cart_by_user_id(&self, user_id: Uuid) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.values().find(|c| c.user_id() == user_id && !c.is_deleted()).cloned())
    }

    async fn resolve_cart_item(&self, cart_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>> {
        let state = self.state.read().await;
        Ok(state.cart_items.iter().find(|i| i.cart_id == cart_id && i.product_id == product_id).cloned())
    }

    async fn create_cart_item(&self, item: &CartItem) -> Result<()> {
        let mut state = self.state.write().await;
        if state.cart_items.iter().any(|i| i.cart_id == item.cart_id && i.product_id == item.product_id) {
            return Err(StoreError::Conflict(format!("cart item {}/{}", item.cart_id, item.product_id)));
        }
        state.cart_items.push(item.clone());
        Ok(())
    }

    async fn update_cart_item(&self, item: &CartItem) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state.cart_items.iter_mut()
            .find(|i| i.cart_id == item.cart_id && i.product_id == item.product_id)
            .ok_or_else(|| StoreError::NotFound(format!("cart item {}/{}", item.cart_id, item.product_id)))?;
        *stored = item.clone();
        Ok(())
    }

    async fn resolve_cart_items_join_product(&self, cart_id: Uuid) -> Result<Vec<CartItem>> {
        let state = self.state.read().await;
        let mut items = Vec::new();
        for stored in state.cart_items.iter().filter(|i| i.cart_id == cart_id) {
            let Some(product) = state.product_for(stored) else { continue };
            let mut item = stored.clone();
            item.unit_price = product.price;
            item.recalculate().map_err(|e| StoreError::Decode(format!("cart item {}/{}: {e}", cart_id, item.product_id)))?;
            items.push(item);
        }
        Ok(items)
    }

    async fn resolve_cart_item_join_product(&self, cart_id: Uuid, product_id: Uuid) -> Result<Option<CartLine>> {
        let state = self.state.read().await;
        Ok(state.cart_items.iter()
            .find(|i| i.cart_id == cart_id && i.product_id == product_id)
            .and_then(|i| {
                let product = state.product_for(i)?;
                Some(CartLine { cart_id, product_id, quantity: i.quantity, unit_price: product.price, stock: product.stock })
            }))
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn resolve_orders(&self, user_id: Option<Uuid>, page: Page) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state.orders.iter().rev()
            .filter(|o| !o.is_deleted() && user_id.map_or(true, |u| o.user_id() == u))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.audit().created.at.cmp(&a.audit().created.at));
        orders.into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|mut order| {
                let id = order.id();
                let items = state.order_items.iter().filter(|i| i.order_id == id).cloned();
                order.attach_items(items).recalculate().map_err(|e| StoreError::Decode(format!("order {id}: {e}")))?;
                Ok(order)
            })
            .collect()
    }

    async fn place_order(&self, order: &Order, cart_id: Uuid) -> Result<()> {
        let armed = *self.fail_point.read().await;
        let mut state = self.state.write().await;
        let mut tx = state.clone();
        tx.insert_order(order, armed)?;
        for item in order.items() {
            tx.insert_order_item(item, armed)?;
            tx.decrement_stock(item.product_id, item.quantity, armed)?;
            tx.delete_cart_item(cart_id, item.product_id, armed)?;
        }
        *state = tx;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::NewProduct;
    use crate::domain::value_objects::Stamp;
    use rust_decimal::Decimal;

    async fn seeded(stock: i32) -> (MemoryStore, Product, Cart) {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let product = Product::create(NewProduct {
            name: "Widget".into(), description: "d".into(), category: "c".into(), brand: "b".into(),
            stock, price: Decimal::new(1000, 2),
        }, user).unwrap();
        store.create_product(&product).await.unwrap();
        let cart = Cart::new(user);
        store.create_cart(&cart).await.unwrap();
        let item = CartItem::new(cart.id(), product.id, 3, product.price, user).unwrap();
        store.create_cart_item(&item).await.unwrap();
        (store, product, cart)
    }

    fn order_for(line: &CartLine, user: Uuid) -> Order {
        let mut order = Order::place(user, "addr");
        let item = OrderItem::from_cart_line(order.id(), line, user).unwrap();
        order.attach_items([item]).recalculate().unwrap();
        order
    }

    #[tokio::test]
    async fn test_join_reads_live_price() {
        let (store, product, cart) = seeded(5).await;
        store.set_price(product.id, Decimal::new(1250, 2)).await.unwrap();
        let line = store.resolve_cart_item_join_product(cart.id(), product.id).await.unwrap().unwrap();
        assert_eq!(line.unit_price, Decimal::new(1250, 2));
        assert_eq!(line.stock, 5);
        let items = store.resolve_cart_items_join_product(cart.id()).await.unwrap();
        assert_eq!(items[0].total_price, Decimal::new(3750, 2));
    }

    #[tokio::test]
    async fn test_place_order_commits_everything() {
        let (store, product, cart) = seeded(5).await;
        let line = store.resolve_cart_item_join_product(cart.id(), product.id).await.unwrap().unwrap();
        let order = order_for(&line, cart.user_id());
        store.place_order(&order, cart.id()).await.unwrap();

        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.resolve_product_by_id(product.id).await.unwrap().stock, 2);
        assert!(store.resolve_cart_item(cart.id(), product.id).await.unwrap().is_none());
        let orders = store.resolve_orders(Some(cart.user_id()), Page { page: 0, limit: 10 }).await.unwrap();
        assert_eq!(orders[0].total_price(), Decimal::new(3000, 2));
    }

    #[tokio::test]
    async fn test_place_order_rolls_back_on_late_failure() {
        let (store, product, cart) = seeded(5).await;
        let line = store.resolve_cart_item_join_product(cart.id(), product.id).await.unwrap().unwrap();
        let order = order_for(&line, cart.user_id());
        store.fail_at(Some(FailPoint::CartItemDelete)).await;

        assert!(matches!(store.place_order(&order, cart.id()).await, Err(StoreError::Unavailable(_))));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.resolve_product_by_id(product.id).await.unwrap().stock, 5);
        assert!(store.resolve_cart_item(cart.id(), product.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_guarded_decrement_refuses_oversell() {
        let (store, product, cart) = seeded(5).await;
        let line = store.resolve_cart_item_join_product(cart.id(), product.id).await.unwrap().unwrap();
        store.set_stock(product.id, 2).await.unwrap();
        let order = order_for(&line, cart.user_id());

        let err = store.place_order(&order, cart.id()).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { product_id } if product_id == product.id));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_cart_item_conflicts() {
        let (store, product, cart) = seeded(5).await;
        let dup = CartItem::new(cart.id(), product.id, 1, product.price, cart.user_id()).unwrap();
        assert!(matches!(store.create_cart_item(&dup).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_soft_deleted_product_is_hidden() {
        let (store, mut product, cart) = seeded(5).await;
        product.id = Uuid::new_v4();
        product.deleted = Some(Stamp::now(cart.user_id()));
        store.create_product(&product).await.unwrap();

        assert!(matches!(store.resolve_product_by_id(product.id).await, Err(StoreError::NotFound(_))));
        assert_eq!(store.resolve_all_products(Page { page: 0, limit: 10 }).await.unwrap().len(), 1);
    }
}
