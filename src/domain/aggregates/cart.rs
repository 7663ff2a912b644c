//! Cart Aggregate

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};
use crate::domain::value_objects::{line_total, sum_totals, Audit, DeletionRecord};
use crate::validation::{overflow, Violations};

/// A user's in-progress selection. `total_price` is derived and never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct Cart {
    id: Uuid,
    user_id: Uuid,
    audit: Audit,
    deleted: Option<DeletionRecord>,
    items: Vec<CartItem>,
    total_price: Decimal,
}

/// One (cart, product) line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartItem {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub audit: Audit,
    pub deleted: Option<DeletionRecord>,
}

/// A cart line read together with the product's live price and stock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CartLine {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub stock: i32,
}

impl CartLine {
    pub fn exceeds_stock(&self) -> bool { self.quantity > self.stock }
}

impl CartItem {
    /// New line for a product not yet in the cart. Quantity must be at least one.
    pub fn new(cart_id: Uuid, product_id: Uuid, quantity: i32, unit_price: Decimal, actor: Uuid) -> Result<Self, ValidationErrors> {
        let mut item = Self {
            cart_id, product_id, quantity, unit_price, total_price: Decimal::ZERO,
            audit: Audit::new(actor), deleted: None,
        };
        item.recalculate()?;
        item.validate()?;
        Ok(item)
    }

    pub fn recalculate(&mut self) -> Result<(), ValidationErrors> {
        self.total_price = line_total(self.quantity, self.unit_price).ok_or_else(|| overflow("total_price"))?;
        Ok(())
    }

    /// Repeated add-to-cart: increments by `added` (which may be negative), never below one,
    /// and refreshes the unit price from the catalog.
    pub fn merge(&mut self, added: i32, unit_price: Decimal, actor: Uuid) -> Result<(), ValidationErrors> {
        self.quantity = self.quantity.saturating_add(added).max(1);
        self.unit_price = unit_price;
        self.recalculate()?;
        self.audit.touch(actor);
        self.validate()
    }
}

impl Validate for CartItem {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Violations::new();
        v.required_id("cart_id", self.cart_id);
        v.required_id("product_id", self.product_id);
        v.positive("quantity", self.quantity);
        v.price("unit_price", self.unit_price);
        v.required_id("created_by", self.audit.created_by());
        v.finish()
    }
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(), user_id, audit: Audit::new(user_id), deleted: None,
            items: vec![], total_price: Decimal::ZERO,
        }
    }

    /// Rebuilds a stored cart without items.
    pub fn restore(id: Uuid, user_id: Uuid, audit: Audit, deleted: Option<DeletionRecord>) -> Self {
        Self { id, user_id, audit, deleted, items: vec![], total_price: Decimal::ZERO }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn audit(&self) -> &Audit { &self.audit }
    pub fn deleted(&self) -> Option<&DeletionRecord> { self.deleted.as_ref() }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn total_price(&self) -> Decimal { self.total_price }
    pub fn is_deleted(&self) -> bool { self.deleted.is_some() }

    /// Attaches the items that belong to this cart. Re-attaching a product replaces its line.
    pub fn attach_items(&mut self, items: impl IntoIterator<Item = CartItem>) -> &mut Self {
        for item in items.into_iter().filter(|i| i.cart_id == self.id) {
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

    /// Stamps the update, recalculates and checks invariants.
    pub fn update(&mut self, actor: Uuid) -> Result<(), ValidationErrors> {
        self.audit.touch(actor);
        self.recalculate()?;
        self.validate()
    }
}

impl Validate for Cart {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Violations::new();
        v.required_id("id", self.id);
        v.required_id("user_id", self.user_id);
        v.required_id("created_by", self.audit.created_by());
        v.finish()?;
        self.items.iter().try_for_each(Validate::validate)
    }
}
