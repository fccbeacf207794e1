use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::result::ApiMessage;

#[derive(Debug)]
pub enum AppError {
    ClientIpUnavailable,
    RateLimitExceeded,
    InvalidRequestBody,
    Database(sqlx::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ClientIpUnavailable | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidRequestBody => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AppError::ClientIpUnavailable => "Failed to determine client IP",
            AppError::RateLimitExceeded => "Rate limit exceeded",
            AppError::InvalidRequestBody => "Invalid request body",
            AppError::Database(_) => "Database error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Database(err) = &self {
            tracing::error!("Database operation failed: {}", err);
        }

        let status = self.status();
        (status, Json(ApiMessage::new(status, self.message()))).into_response()
    }
}
