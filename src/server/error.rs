//! HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::messages::ErrorResponse;
use crate::error::Error;

/// A failed request.
///
/// Every failure is answered with 400 and `{error, kind}`; `kind` is absent
/// when the body could not be decoded.
#[derive(Debug)]
pub enum ApiError {
    /// The request body is not valid JSON for the endpoint.
    BadRequest(String),
    /// The operation failed; `context` names the endpoint's operation.
    Failed { context: &'static str, source: Error },
}

impl ApiError {
    pub fn failed(context: &'static str) -> impl FnOnce(Error) -> Self {
        move |source| Self::Failed { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::BadRequest(reason) => ErrorResponse {
                error: format!("Bad request: {}", reason),
                kind: None,
            },
            Self::Failed { context, source } => ErrorResponse {
                error: format!("{}: {}", context, source),
                kind: Some(source.kind()),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        let kind = body.kind.map_or("bad_request", |k| k.as_str());
        warn!(error = %body.error, kind, "request failed");
        (self.status_code(), Json(body)).into_response()
    }
}
