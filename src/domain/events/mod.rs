//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::Order;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, user_id: Uuid, total: Decimal, lines: Vec<PlacedLine> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedLine { pub product_id: Uuid, pub quantity: i32, pub unit_price: Decimal }

impl OrderEvent {
    pub fn placed(order: &Order) -> Self {
        Self::Placed {
            order_id: order.id(),
            user_id: order.user_id(),
            total: order.total_price(),
            lines: order.items().iter().map(|i| PlacedLine { product_id: i.product_id, quantity: i.quantity, unit_price: i.unit_price }).collect(),
        }
    }

    pub fn subject(&self) -> &'static str {
        match self { Self::Placed { .. } => "orders.placed" }
    }
}
