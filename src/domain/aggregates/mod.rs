//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{NewProduct, Product};
pub use order::{Order, OrderItem, OrderStatus, UnknownStatus};
pub use cart::{Cart, CartItem, CartLine};
