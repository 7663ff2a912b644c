//! Cart service: add-to-cart and cart lookup.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::{Cart, CartItem, Product};
use crate::store::{CartRepository, CatalogRepository};
use crate::{CommerceError, Result};

#[derive(Clone, Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(rename = "productID")]
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn CatalogRepository>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, products: Arc<dyn CatalogRepository>) -> Self {
        Self { carts, products }
    }

    /// Adds `quantity` of a product to the user's cart, creating the cart on first use.
    /// A repeated add increments the existing line and refreshes its price.
    #[instrument(skip(self), fields(product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add_to_cart(&self, user_id: Uuid, request: AddToCartRequest) -> Result<Cart> {
        let product = self.products.resolve_product_by_id(request.product_id).await?;
        if !product.has_stock_for(request.quantity) {
            return Err(CommerceError::BadRequest("quantity cannot be greater than stock".into()));
        }

        let mut cart = self.resolve_or_create_cart(user_id).await?;
        self.upsert_item(&cart, &product, request.quantity, user_id).await?;

        let items = self.carts.resolve_cart_items_join_product(cart.id()).await?;
        cart.attach_items(items);
        cart.update(user_id)?;
        self.carts.update_cart(&cart).await?;
        Ok(cart)
    }

    /// The user's cart with live prices and totals.
    pub async fn resolve_cart_by_user_id(&self, user_id: Uuid) -> Result<Cart> {
        let mut cart = self.carts.resolve_cart_by_user_id(user_id).await?
            .ok_or_else(|| CommerceError::NotFound(format!("cart for user {user_id}")))?;
        let items = self.carts.resolve_cart_items_join_product(cart.id()).await?;
        cart.attach_items(items).recalculate()?;
        Ok(cart)
    }

    async fn resolve_or_create_cart(&self, user_id: Uuid) -> Result<Cart> {
        if let Some(cart) = self.carts.resolve_cart_by_user_id(user_id).await? {
            return Ok(cart);
        }
        let cart = Cart::new(user_id);
        self.carts.create_cart(&cart).await?;
        info!(cart_id = %cart.id(), %user_id, "cart created");
        Ok(cart)
    }

    async fn upsert_item(&self, cart: &Cart, product: &Product, quantity: i32, actor: Uuid) -> Result<()> {
        match self.carts.resolve_cart_item(cart.id(), product.id).await? {
            None => {
                if quantity <= 0 {
                    return Err(CommerceError::BadRequest("quantity not valid".into()));
                }
                let item = CartItem::new(cart.id(), product.id, quantity, product.price, actor)?;
                self.carts.create_cart_item(&item).await?;
            }
            Some(mut item) => {
                item.merge(quantity, product.price, actor)?;
                self.carts.update_cart_item(&item).await?;
            }
        }
        Ok(())
    }
}
