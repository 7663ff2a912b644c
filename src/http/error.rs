//! HTTP mapping of [`CommerceError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::CommerceError;

impl CommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) | Self::OutOfStock { .. } => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Storage details stay in the logs.
        let message = match &self {
            Self::Storage(e) => {
                error!("storage failure: {e}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use uuid::Uuid;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(CommerceError::NotFound("cart".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(CommerceError::Unauthenticated("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(CommerceError::Unauthorized("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(CommerceError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CommerceError::Unprocessable("x".into()).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(CommerceError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(CommerceError::OutOfStock { product_id: Uuid::nil() }.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            CommerceError::Storage(StoreError::Unavailable("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_map_to_domain_errors() {
        let id = Uuid::new_v4();
        assert!(matches!(CommerceError::from(StoreError::InsufficientStock { product_id: id }), CommerceError::OutOfStock { product_id } if product_id == id));
        assert!(matches!(CommerceError::from(StoreError::NotFound("cart".into())), CommerceError::NotFound(_)));
        assert!(matches!(CommerceError::from(StoreError::Conflict("order".into())), CommerceError::Conflict(_)));
    }
}
