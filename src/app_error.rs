//! Error taxonomy and the `{message, data}` response envelope.
//!
//! Every handler returns `Result<_, AppError>`; the variant decides both the
//! HTTP status and the body shape written back to the client.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard success envelope.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> IntoResponse for StdResponse<T, M>
where
    T: Serialize,
    M: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Body used for validation and internal failures.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

/// Body used for authentication outcomes and malformed payloads.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StatusBody {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidRequest(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            AppError::BadRequest(message) | AppError::NotFound(message) => {
                tracing::warn!(%status, %message, "request rejected");
                (
                    status,
                    StdResponse::<(), String> {
                        data: None,
                        message: Some(message),
                    },
                )
                    .into_response()
            }
            AppError::InvalidRequest(message) | AppError::Unauthorized(message) => {
                tracing::warn!(%status, %message, "request rejected");
                (
                    status,
                    Json(StatusBody {
                        success: false,
                        message,
                    }),
                )
                    .into_response()
            }
            AppError::Validation(details) => {
                tracing::warn!(%status, %details, "validation failed");
                (
                    status,
                    Json(ErrorBody {
                        error: "Validation failed".into(),
                        details,
                    }),
                )
                    .into_response()
            }
            AppError::Other(err) => {
                tracing::error!(error = ?err, "unexpected error");
                (
                    status,
                    Json(ErrorBody {
                        error: "Internal server error".into(),
                        details: "An unexpected error occurred".into(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        AppError::Other(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(_: QueryRejection) -> Self {
        AppError::BadRequest("Invalid or missing parameters".into())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::BadRequest("Invalid or missing parameters".into())
    }
}

/// `Json` extractor whose rejections are reported through [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Query` extractor whose rejections are reported through [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `Path` extractor whose rejections are reported through [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
