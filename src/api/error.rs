use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API error taxonomy, mapped onto HTTP statuses in one place so
/// handlers can stay as `Result<_, ApiError>` with `?`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("URL not found")]
    NotFound,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Not authorized to delete this URL")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            ApiError::Store(err) => {
                tracing::error!(error = %err, "storage failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}
