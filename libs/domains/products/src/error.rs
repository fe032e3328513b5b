use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::AppError;
use thiserror::Error;

use crate::models::FieldError;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Invalid product: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("Malformed request body: {0}")]
    Decode(#[from] JsonRejection),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Missing products answer with a bare 404 and field errors with a JSON array
/// of formatted messages; everything else uses the shared error envelope.
impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        match self {
            ProductError::NotFound(id) => {
                tracing::info!(product_id = %id, "Product not found");
                StatusCode::NOT_FOUND.into_response()
            }
            ProductError::Validation(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                tracing::info!(?messages, "Product validation failed");
                (StatusCode::BAD_REQUEST, Json(messages)).into_response()
            }
            ProductError::Decode(rejection) => AppError::JsonExtractorRejection(rejection).into_response(),
            ProductError::Database(msg) => AppError::Database(msg).into_response(),
            ProductError::Internal(msg) => AppError::InternalServerError(msg).into_response(),
        }
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}
