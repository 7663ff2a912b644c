//! Application services: the operations the HTTP layer exposes.

use crate::store::Page;
use crate::{CommerceError, Result};

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

pub use cart::{AddToCartRequest, CartService};
pub use catalog::CatalogService;
pub use checkout::{CheckoutRequest, CheckoutService};
pub use orders::OrderService;

const DEFAULT_LIMIT: u32 = 20;

/// Builds a zero-based page. The limit must be positive and is capped at [`Page::MAX_LIMIT`].
pub fn page(page: Option<u32>, limit: Option<u32>) -> Result<Page> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        return Err(CommerceError::BadRequest("limit must be greater than zero".into()));
    }
    Ok(Page { page: page.unwrap_or(0), limit: limit.min(Page::MAX_LIMIT) })
}
