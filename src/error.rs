//! Domain error taxonomy, mapped to HTTP responses in one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ApiResponse, OrderStatus};

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("insufficient funds: balance {balance} is less than required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("payment for order {0} is not completed")]
    PaymentNotCompleted(Uuid),

    #[error("unauthorized")]
    Unauthorized,

    #[error("already processed")]
    AlreadyProcessed,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            ServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ServiceError::PaymentNotCompleted(_) => StatusCode::CONFLICT,
            ServiceError::Unauthorized => StatusCode::FORBIDDEN,
            ServiceError::AlreadyProcessed => StatusCode::CONFLICT,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Backend detail stays in the log; the client gets a generic message.
        let message = match &self {
            ServiceError::Database(err) => {
                tracing::error!(error = %err, "database error");
                "internal error".to_string()
            }
            ServiceError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

/// Shorthand used by validator-checked request handlers.
impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            ServiceError::InsufficientFunds {
                balance: 1,
                required: 2
            }
            .status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ServiceError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Completed
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Unauthorized.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::AlreadyProcessed.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ServiceError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn transition_errors_name_both_states() {
        let err = ServiceError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Delivered,
        };
        assert_eq!(
            err.to_string(),
            "invalid transition from delivered to delivered"
        );
    }
}
