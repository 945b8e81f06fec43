//! Error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::value_objects::Quantity;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("quantity would overflow")]
    QuantityOverflow,

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Sweet not found")]
    NotFound,

    #[error("Access denied")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Admin access required")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Insufficient stock. Only {available} left.")]
    InsufficientStock { available: Quantity },

    #[error("{0}")]
    Validation(String),

    /// Duplicate username. Reported to clients as a generic registration failure.
    #[error("Error registering user")]
    UsernameTaken,

    #[error("Error registering user")]
    Registration(String),

    #[error("Server error")]
    Server(String),

    #[error("Server error")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::InsufficientStock { .. } | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UsernameTaken | Self::Registration(_) | Self::Server(_) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Store(e) => tracing::error!(error = %e, "store failure"),
            Self::Server(e) | Self::Registration(e) => tracing::error!(error = %e, "request failed"),
            _ => {}
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
