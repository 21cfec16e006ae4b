//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": "<message>"}`. Store failures are logged
//! here and replaced with a generic per-route message.

use std::time::Duration;

use axum::{
  Json,
  http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName =
  HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("too many requests: {message}")]
  TooManyRequests {
    message:     String,
    retry_after: Duration,
    limit:       u32,
  },

  /// `message` is what the client sees; `source` only reaches the log.
  #[error("{message}: {source}")]
  Internal {
    message: &'static str,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Classify a pipeline error. `failure` is the client-facing message used
  /// if the error turns out to be a store failure.
  pub fn from_core(e: taleweave_core::Error, failure: &'static str) -> Self {
    use taleweave_core::Error as E;

    match e {
      E::StoryNotFound(_) => Self::NotFound(e.to_string()),
      E::MissingStoryFields
      | E::StarterSentences(_)
      | E::FieldTooLong { .. }
      | E::MissingText
      | E::TextTooLong { .. }
      | E::LineSentences(_) => Self::BadRequest(e.to_string()),
      E::SlugConflict(_) => Self::Conflict(e.to_string()),
      E::RateLimited { message, retry_after, limit } => {
        Self::TooManyRequests { message, retry_after, limit }
      }
      E::Store(source) => Self::Internal { message: failure, source },
    }
  }
}

/// Whole seconds, rounded up so clients never retry early.
fn ceil_secs(d: Duration) -> u64 {
  d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// Set the `RateLimit-Limit`, `-Remaining` and `-Reset` headers.
pub(crate) fn insert_ratelimit_headers(
  headers: &mut HeaderMap,
  limit: u32,
  remaining: u32,
  reset: Duration,
) {
  headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
  headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
  headers.insert(RATELIMIT_RESET, HeaderValue::from(ceil_secs(reset)));
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => error_body(StatusCode::NOT_FOUND, &m),
      ApiError::BadRequest(m) => error_body(StatusCode::BAD_REQUEST, &m),
      ApiError::Conflict(m) => error_body(StatusCode::CONFLICT, &m),
      ApiError::TooManyRequests { message, retry_after, limit } => {
        let mut res = error_body(StatusCode::TOO_MANY_REQUESTS, &message);
        let headers = res.headers_mut();
        let secs = HeaderValue::from(ceil_secs(retry_after));
        headers.insert(header::RETRY_AFTER, secs);
        insert_ratelimit_headers(headers, limit, 0, retry_after);
        res
      }
      ApiError::Internal { message, source } => {
        tracing::error!(error = %source, "{message}");
        error_body(StatusCode::INTERNAL_SERVER_ERROR, message)
      }
    }
  }
}

fn error_body(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn retry_after_rounds_up() {
    assert_eq!(ceil_secs(Duration::from_secs(60)), 60);
    assert_eq!(ceil_secs(Duration::from_millis(59_001)), 60);
    assert_eq!(ceil_secs(Duration::ZERO), 0);
  }

  #[test]
  fn classification_follows_error_kind() {
    use taleweave_core::Error as E;

    let failure = "Failed to add line";
    assert!(matches!(
      ApiError::from_core(E::StoryNotFound("x".into()), failure),
      ApiError::NotFound(m) if m == "Story not found"
    ));
    assert!(matches!(
      ApiError::from_core(E::LineSentences(3), failure),
      ApiError::BadRequest(m) if m == "Your contribution must be 1-2 sentences"
    ));
    assert!(matches!(
      ApiError::from_core(E::SlugConflict("x".into()), failure),
      ApiError::Conflict(_)
    ));

    let io = std::io::Error::other("disk on fire");
    assert!(matches!(
      ApiError::from_core(E::Store(Box::new(io)), failure),
      ApiError::Internal { message: "Failed to add line", .. }
    ));
  }

  #[test]
  fn rate_limit_response_carries_retry_headers() {
    let res = ApiError::TooManyRequests {
      message:     "slow down".into(),
      retry_after: Duration::from_millis(41_500),
      limit:       1,
    }
    .into_response();

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()[header::RETRY_AFTER], "42");
    assert_eq!(res.headers()["ratelimit-limit"], "1");
    assert_eq!(res.headers()["ratelimit-remaining"], "0");
    assert_eq!(res.headers()["ratelimit-reset"], "42");
  }

  #[test]
  fn internal_errors_hide_their_source() {
    let res = ApiError::Internal {
      message: "Failed to fetch stories",
      source:  Box::new(std::io::Error::other("secret path /var/db")),
    }
    .into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
