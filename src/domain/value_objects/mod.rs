//! Value objects for the storefront

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point in time together with the user that acted at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub at: DateTime<Utc>,
    pub by: Uuid,
}

impl Stamp {
    pub fn now(by: Uuid) -> Self { Self { at: Utc::now(), by } }

    /// Rebuilds a stamp from a pair of nullable columns. Half-set pairs read as absent.
    pub fn from_columns(at: Option<DateTime<Utc>>, by: Option<Uuid>) -> Option<Self> {
        match (at, by) {
            (Some(at), Some(by)) => Some(Self { at, by }),
            _ => None,
        }
    }
}

/// Soft-delete marker: a deletion is recorded as one unit or not at all.
pub type DeletionRecord = Stamp;

/// Created/updated audit fields carried by every mutable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created: Stamp,
    pub updated: Option<Stamp>,
}

impl Audit {
    pub fn new(by: Uuid) -> Self { Self { created: Stamp::now(by), updated: None } }
    pub fn touch(&mut self, by: Uuid) { self.updated = Some(Stamp::now(by)); }
    pub fn created_by(&self) -> Uuid { self.created.by }
}

/// Line total for a quantity at a unit price, `None` on overflow.
pub fn line_total(quantity: i32, unit_price: Decimal) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity))
}

/// Sum of line totals, `None` on overflow.
pub fn sum_totals(totals: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    totals.into_iter().try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t))
}

/// Role of an authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    /// Resolves a role claim against the configured elevated role name.
    pub fn from_claim(claim: &str, admin_role: &str) -> Self {
        if claim == admin_role { Self::Admin } else { Self::Customer }
    }
}

/// The verified identity behind a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }
    pub fn customer(user_id: Uuid) -> Self { Self::new(user_id, Role::Customer) }
    pub fn admin(user_id: Uuid) -> Self { Self::new(user_id, Role::Admin) }
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    /// True when the caller owns the resource or holds the elevated role.
    pub fn can_act_for(&self, owner: Uuid) -> bool { self.user_id == owner || self.is_admin() }
}
