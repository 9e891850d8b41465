//! Mapping from service errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::records::RecordError;
use services::services::{detail::DetailError, listing::ListError};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    List(#[from] ListError),
    #[error(transparent)]
    Detail(#[from] DetailError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

fn record_status(err: &RecordError) -> StatusCode {
    match err {
        RecordError::UnknownColumn { .. } | RecordError::BadValue { .. } => {
            StatusCode::BAD_REQUEST
        }
        RecordError::NotFound => StatusCode::NOT_FOUND,
        RecordError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::List(ListError::UnknownTable(_)) => StatusCode::NOT_FOUND,
            ApiError::List(ListError::Record(err)) => record_status(err),
            ApiError::List(ListError::Serde(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Detail(DetailError::UnknownTable(_) | DetailError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Detail(DetailError::BadNavContext { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Detail(DetailError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Detail(DetailError::Record(err)) => record_status(err),
            ApiError::Detail(DetailError::Serde(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
