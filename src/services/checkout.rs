//! Checkout: turns selected cart lines into a placed order.
//!
//! Validation runs fail-fast in a fixed order: the request itself, cart existence,
//! caller access, then each requested line against live catalog stock. The first failure
//! aborts the whole checkout. Writes happen in a single `place_order` transaction which
//! re-checks stock under a guarded decrement.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Order, OrderItem};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::Caller;
use crate::messaging::EventPublisher;
use crate::store::{CartRepository, OrderRepository};
use crate::{CommerceError, Result};

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1))]
    pub address: String,
    #[serde(rename = "cart_items")]
    #[validate(length(min = 1))]
    pub product_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct CheckoutService {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    events: Arc<dyn EventPublisher>,
}

impl CheckoutService {
    pub fn new(carts: Arc<dyn CartRepository>, orders: Arc<dyn OrderRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self { carts, orders, events }
    }

    #[instrument(skip(self, caller, request), fields(user_id = %caller.user_id, items = request.product_ids.len()))]
    pub async fn checkout(&self, cart_id: Uuid, caller: &Caller, request: CheckoutRequest) -> Result<Order> {
        request.validate()?;
        let mut seen = HashSet::new();
        if let Some(dup) = request.product_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(CommerceError::BadRequest(format!("product {dup} requested more than once")));
        }

        if !self.carts.cart_exists(cart_id).await? {
            return Err(CommerceError::NotFound(format!("cart {cart_id}")));
        }
        let cart = self.carts.resolve_cart_by_id(cart_id).await?;
        if !caller.can_act_for(cart.user_id()) {
            warn!(%cart_id, "checkout refused: caller does not own cart");
            return Err(CommerceError::Unauthorized("cart belongs to another user".into()));
        }

        let mut order = Order::place(caller.user_id, request.address);
        let mut items = Vec::with_capacity(request.product_ids.len());
        for product_id in request.product_ids {
            let line = self.carts.resolve_cart_item_join_product(cart_id, product_id).await?
                .ok_or_else(|| CommerceError::NotFound(format!("product {product_id} in cart {cart_id}")))?;
            if line.exceeds_stock() {
                warn!(%product_id, requested = line.quantity, stock = line.stock, "out of stock");
                return Err(CommerceError::OutOfStock { product_id });
            }
            items.push(OrderItem::from_cart_line(order.id(), &line, caller.user_id)?);
        }
        order.attach_items(items).recalculate()?;
        order.validate()?;

        self.orders.place_order(&order, cart_id).await.map_err(|e| {
            warn!(order_id = %order.id(), "order not placed: {e}");
            CommerceError::from(e)
        })?;
        info!(order_id = %order.id(), total = %order.total_price(), "order placed");

        if let Err(e) = self.events.publish(&OrderEvent::placed(&order)).await {
            warn!(order_id = %order.id(), "order event not published: {e}");
        }
        Ok(order)
    }
}
