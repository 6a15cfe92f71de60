//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every non-2xx response carries the same JSON envelope:
//!
//! ```json
//! { "success": false, "message": "...", "error": "...", "exceptionType": "NotFound" }
//! ```
//!
//! `message` is omitted when there is nothing to add to `error`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use custman_core::ErrorKind;
use serde::Serialize;
use thiserror::Error;

/// Text returned in place of internal failure details.
const INTERNAL_ERROR: &str = "something went wrong, please try again later";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] custman_core::Error),

  #[error("invalid request body")]
  Body(#[from] JsonRejection),

  #[error("invalid path parameter")]
  Path(#[from] PathRejection),

  #[error("invalid query string")]
  Query(#[from] QueryRejection),
}

impl ApiError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      Self::Body(JsonRejection::MissingJsonContentType(_)) => {
        ErrorKind::UnsupportedMediaType
      }
      Self::Body(_) | Self::Path(_) | Self::Query(_) => ErrorKind::InvalidArgument,
    }
  }

  /// Extractor detail, when there is any.
  fn detail(&self) -> Option<String> {
    match self {
      Self::Core(_) => None,
      Self::Body(r) => Some(r.body_text()),
      Self::Path(r) => Some(r.body_text()),
      Self::Query(r) => Some(r.body_text()),
    }
  }
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::InvalidArgument | ErrorKind::GenericApplicationError => {
      StatusCode::BAD_REQUEST
    }
    ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
    ErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
    ErrorKind::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
    ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    ErrorKind::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
  success:        bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  message:        Option<String>,
  error:          String,
  exception_type: ErrorKind,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let status = status_for(kind);

    if status.is_server_error() {
      tracing::error!(%kind, error = %self, "request failed");
    } else {
      tracing::warn!(%kind, error = %self, "request rejected");
    }

    let error = match kind {
      ErrorKind::Unclassified => INTERNAL_ERROR.to_owned(),
      ErrorKind::Timeout => "timeout".to_owned(),
      ErrorKind::NotImplemented => "resource not implemented".to_owned(),
      _ => self.to_string(),
    };

    let body = Envelope {
      success: false,
      message: self.detail(),
      error,
      exception_type: kind,
    };
    (status, Json(body)).into_response()
  }
}
