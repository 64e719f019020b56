use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Unknown product variants: {}", join_ids(.0))]
    UnknownVariants(Vec<Uuid>),

    #[error("Insufficient stock for variant {0}")]
    InsufficientStock(Uuid),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Payment metadata too large ({0} bytes)")]
    MetadataTooLarge(usize),

    #[error("No order found for payment intent {0}")]
    OrderNotFoundForIntent(String),

    #[error("Payment processor error")]
    Processor(#[from] reqwest::Error),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::UnknownVariants(_)
            | AppError::InsufficientStock(_)
            | AppError::InvalidSignature
            | AppError::MetadataTooLarge(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            // Not-found tells the processor to redeliver the event later.
            AppError::OrderNotFoundForIntent(_) => StatusCode::NOT_FOUND,
            AppError::Processor(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Display strings for backend failures are generic; internal detail
        // stays in the logs only.
        let body = ApiResponse::failure(self.to_string());

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
