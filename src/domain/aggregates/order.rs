//! Order Aggregate

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};
use crate::domain::aggregates::CartLine;
use crate::domain::value_objects::{line_total, sum_totals, Audit, DeletionRecord};
use crate::validation::{overflow, Violations};

/// Immutable snapshot of a checkout. Items and prices are fixed once placed.
#[derive(Clone, Debug, Serialize)]
pub struct Order {
    id: Uuid,
    user_id: Uuid,
    address: String,
    status: OrderStatus,
    audit: Audit,
    deleted: Option<DeletionRecord>,
    items: Vec<OrderItem>,
    total_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderItem {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub audit: Audit,
    pub deleted: Option<DeletionRecord>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending" }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)] pub struct UnknownStatus(pub String);
impl std::error::Error for UnknownStatus {}
impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown order status {:?}", self.0) }
}

impl OrderItem {
    /// Snapshots a validated cart line. The joined catalog price is the one captured.
    pub fn from_cart_line(order_id: Uuid, line: &CartLine, actor: Uuid) -> Result<Self, ValidationErrors> {
        let mut item = Self {
            order_id, product_id: line.product_id, quantity: line.quantity, unit_price: line.unit_price,
            total_price: Decimal::ZERO, audit: Audit::new(actor), deleted: None,
        };
        item.recalculate()?;
        Ok(item)
    }

    pub fn recalculate(&mut self) -> Result<(), ValidationErrors> {
        self.total_price = line_total(self.quantity, self.unit_price).ok_or_else(|| overflow("total_price"))?;
        Ok(())
    }
}

impl Validate for OrderItem {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Violations::new();
        v.required_id("order_id", self.order_id);
        v.required_id("product_id", self.product_id);
        v.positive("quantity", self.quantity);
        v.price("unit_price", self.unit_price);
        v.required_id("created_by", self.audit.created_by());
        v.finish()
    }
}

impl Order {
    /// New pending order owned by `user_id`.
    pub fn place(user_id: Uuid, address: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(), user_id, address: address.into(), status: OrderStatus::Pending,
            audit: Audit::new(user_id), deleted: None, items: vec![], total_price: Decimal::ZERO,
        }
    }

    pub fn restore(id: Uuid, user_id: Uuid, address: String, status: OrderStatus, audit: Audit, deleted: Option<DeletionRecord>) -> Self {
        Self { id, user_id, address, status, audit, deleted, items: vec![], total_price: Decimal::ZERO }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn address(&self) -> &str { &self.address }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn audit(&self) -> &Audit { &self.audit }
    pub fn deleted(&self) -> Option<&DeletionRecord> { self.deleted.as_ref() }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn total_price(&self) -> Decimal { self.total_price }
    pub fn is_deleted(&self) -> bool { self.deleted.is_some() }

    /// Attaches the items that belong to this order.
    pub fn attach_items(&mut self, items: impl IntoIterator<Item = OrderItem>) -> &mut Self {
        for item in items.into_iter().filter(|i| i.order_id == self.id) {
            match self.items.iter_mut().find(|i| i.product_id == item.product_id) {
                Some(existing) => *existing = item,
                None => self.items.push(item),
            }
        }
        self
    }

    pub fn recalculate(&mut self) -> Result<(), ValidationErrors> {
        for item in &mut self.items { item.recalculate()?; }
        self.total_price = sum_totals(self.items.iter().map(|i| i.total_price)).ok_or_else(|| overflow("total_price"))?;
        Ok(())
    }
}

impl Validate for Order {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Violations::new();
        v.required_id("id", self.id);
        v.required_id("user_id", self.user_id);
        v.required_text("address", &self.address);
        v.required_id("created_by", self.audit.created_by());
        if self.items.is_empty() { v.add("items", "required"); }
        v.finish()?;
        self.items.iter().try_for_each(Validate::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, cents: i64) -> CartLine {
        CartLine { cart_id: Uuid::new_v4(), product_id: Uuid::new_v4(), quantity, unit_price: Decimal::new(cents, 2), stock: 100 }
    }

    #[test]
    fn test_order_snapshot() {
        let user = Uuid::new_v4();
        let mut order = Order::place(user, "1 Market St");
        let items = [line(3, 1000), line(1, 450)].map(|l| OrderItem::from_cart_line(order.id(), &l, user).unwrap());
        order.attach_items(items);
        order.recalculate().unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.items()[0].total_price, Decimal::new(3000, 2));
        assert_eq!(order.total_price(), Decimal::new(3450, 2));
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_attach_ignores_foreign_items() {
        let user = Uuid::new_v4();
        let mut order = Order::place(user, "addr");
        let foreign = OrderItem::from_cart_line(Uuid::new_v4(), &line(1, 100), user).unwrap();
        order.attach_items([foreign]);
        assert!(order.items().is_empty());
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_overflowing_line_is_a_violation() {
        let mut l = line(2, 0);
        l.unit_price = Decimal::MAX;
        let err = OrderItem::from_cart_line(Uuid::new_v4(), &l, Uuid::new_v4()).unwrap_err();
        assert!(err.field_errors().contains_key("total_price"));
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
