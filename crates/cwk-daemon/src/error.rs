//! HTTP mapping of catalog and authorization failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cwk_catalog::{CatalogError, ErrorKind};
use tracing::{error, warn};

use crate::api_types::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    /// No caller identity on the request.
    Unauthenticated,
    /// Caller is known but may not touch the resource.
    Forbidden(String),
    Catalog(CatalogError),
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError::Catalog(e)
    }
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "UNAUTHENTICATED: missing caller identity".to_string(),
            ),
            ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", format!("FORBIDDEN: {m}")),
            ApiError::Catalog(e) => {
                let kind = e.kind();
                let status = match kind {
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                    ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                    ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
                    ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, kind.as_str(), e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();
        if status.is_server_error() {
            error!(kind, "{message}");
        } else if status == StatusCode::CONFLICT {
            warn!(kind, "{message}");
        }
        (
            status,
            Json(ErrorResponse {
                error: message,
                kind: kind.to_string(),
            }),
        )
            .into_response()
    }
}
