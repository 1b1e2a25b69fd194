use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use crate::EcommerceError;

impl EcommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Payment(_) => StatusCode::PAYMENT_REQUIRED,
            Self::DuplicateCustomer(_) | Self::Config(_) | Self::StorageError(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(errors) => json!({"error": "Validation failed", "details": errors}),
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "request failed");
                json!({"error": "Internal server error"})
            }
            _ => json!({"error": self.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(EcommerceError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(EcommerceError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(EcommerceError::NotFound("Order").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(EcommerceError::DuplicateCustomer("k".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(EcommerceError::Payment("declined".into()).into_response().status(), StatusCode::PAYMENT_REQUIRED);
    }
}
