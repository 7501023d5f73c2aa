use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::iss::IssError;
use crate::orbit::{CatalogError, OrbitError};

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(&'static str),
    Upstream(String),
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Validation(e.body_text())
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Http(_) | CatalogError::Empty(_) => ApiError::Upstream(e.to_string()),
            CatalogError::DirectoryNotFound(_) | CatalogError::Io(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<OrbitError> for ApiError {
    fn from(e: OrbitError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<IssError> for ApiError {
    fn from(e: IssError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ApiError::NotFound(reason) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(reason))).into_response()
            }
            ApiError::Upstream(msg) => {
                log::warn!("Upstream failure: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorResponse::with_message("upstream_unavailable", &msg)),
                )
                    .into_response()
            }
            ApiError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::with_message("internal_error", &msg)),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
