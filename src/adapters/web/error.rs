//! JSON error responses for the web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::error::LadderError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &LadderError) -> StatusCode {
    match err {
        LadderError::ConfigMissing { .. }
        | LadderError::ConfigInvalid { .. }
        | LadderError::ConfigParse { .. } => StatusCode::BAD_REQUEST,
        LadderError::NoData { .. } => StatusCode::NOT_FOUND,
        LadderError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LadderError::DataSource { .. }
        | LadderError::EmptyHistory
        | LadderError::Report { .. }
        | LadderError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<LadderError> for WebError {
    fn from(err: LadderError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
