use std::sync::Arc;

use crate::domain::aggregates::Order;
use crate::domain::value_objects::Caller;
use crate::store::{OrderRepository, Page};
use crate::Result;

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self { Self { orders } }

    /// Admins see every order; everyone else sees their own.
    pub async fn resolve_all_orders(&self, caller: &Caller, page: Page) -> Result<Vec<Order>> {
        let owner = if caller.is_admin() { None } else { Some(caller.user_id) };
        Ok(self.orders.resolve_orders(owner, page).await?)
    }
}
