//! Caller identity.
//!
//! The authenticating gateway verifies the token and forwards the subject and role as
//! `x-user-id` and `x-user-role`.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use super::AppState;
use crate::domain::value_objects::{Caller, Role};
use crate::CommerceError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = CommerceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| CommerceError::Unauthenticated("missing caller identity".into()))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| CommerceError::Unauthenticated("malformed caller identity".into()))?;
        let role = header(parts, USER_ROLE_HEADER).map_or(Role::Customer, |claim| Role::from_claim(claim, &state.admin_role));
        Ok(Caller::new(user_id, role))
    }
}
