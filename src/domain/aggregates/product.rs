//! Product Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};
use crate::domain::value_objects::{Audit, DeletionRecord};
use crate::validation::{storable_price, Violations};

/// Catalog entry. Stock is maintained by inventory processes outside the storefront.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub stock: i32,
    pub price: Decimal,
    pub audit: Audit,
    pub deleted: Option<DeletionRecord>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub brand: String,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(custom = "storable_price")]
    pub price: Decimal,
}

impl Product {
    pub fn create(req: NewProduct, actor: Uuid) -> Result<Self, ValidationErrors> {
        req.validate()?;
        let product = Self {
            id: Uuid::now_v7(), name: req.name, description: req.description,
            category: req.category, brand: req.brand, stock: req.stock, price: req.price,
            audit: Audit::new(actor), deleted: None,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn is_deleted(&self) -> bool { self.deleted.is_some() }
    pub fn has_stock_for(&self, quantity: i32) -> bool { quantity <= self.stock }
}

impl Validate for Product {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Violations::new();
        v.required_id("id", self.id);
        v.required_text("name", &self.name);
        v.required_text("description", &self.description);
        v.required_text("category", &self.category);
        v.required_text("brand", &self.brand);
        v.non_negative("stock", self.stock);
        v.price("price", self.price);
        v.required_id("created_by", self.audit.created_by());
        v.finish()
    }
}
