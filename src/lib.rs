//! OpenSASE Storefront
//!
//! Catalog, cart and checkout backend.
//!
//! ## Features
//! - Product catalog
//! - Per-user shopping cart with live catalog pricing
//! - Checkout of selected cart lines into an immutable order, in one transaction
//! - Order history
//! - `orders.placed` events over NATS

use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

pub mod config;
pub mod domain;
pub mod http;
pub mod messaging;
pub mod services;
pub mod store;
pub mod validation;

pub use config::Config;
pub use store::StoreError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CommerceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("product {product_id} is out of stock")]
    OutOfStock { product_id: Uuid },

    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for CommerceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict(what) => Self::Conflict(what),
            StoreError::InsufficientStock { product_id } => Self::OutOfStock { product_id },
            other => Self::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CommerceError>;
