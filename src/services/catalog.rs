//! Catalog service

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::aggregates::{NewProduct, Product};
use crate::domain::value_objects::Caller;
use crate::store::{CatalogRepository, Page};
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn CatalogRepository>) -> Self { Self { products } }

    /// Adds a product. Only the elevated role may do this.
    #[instrument(skip(self, request), fields(user_id = %caller.user_id))]
    pub async fn create_product(&self, caller: &Caller, request: NewProduct) -> Result<Product> {
        if !caller.is_admin() {
            warn!("non-admin attempted to create a product");
            return Err(CommerceError::Unauthorized("only admins may create products".into()));
        }
        let product = Product::create(request, caller.user_id)?;
        if self.products.product_exists(product.id).await? {
            return Err(CommerceError::Conflict(format!("product {}", product.id)));
        }
        self.products.create_product(&product).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn resolve_product_by_id(&self, id: Uuid) -> Result<Product> {
        Ok(self.products.resolve_product_by_id(id).await?)
    }

    pub async fn resolve_all_products(&self, page: Page) -> Result<Vec<Product>> {
        Ok(self.products.resolve_all_products(page).await?)
    }
}
