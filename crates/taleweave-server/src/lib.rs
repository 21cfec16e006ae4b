//! Application assembly for the Taleweave server.
//!
//! Turns a [`ServerConfig`] into a [`Pipeline`] and a ready-to-serve axum
//! [`Router`] with the API mounted under `/api`.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  http::{HeaderValue, Method, header},
};
use serde::Deserialize;
use taleweave_core::{
  Pipeline,
  limiter::RateLimiter,
  moderation::ProfanityFilter,
  store::StoryStore,
};
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `taleweave.toml` and
/// `TALEWEAVE_*` environment variables. Every key is optional.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Origin allowed to call the API from a browser. No CORS layer if unset.
  pub frontend_url:     Option<String>,
  pub line_window_secs: u64,
  pub lines_per_window: u32,
  /// Added to the built-in profanity list.
  pub blocked_words:    Vec<String>,
  /// Removed from the built-in profanity list.
  pub allowed_words:    Vec<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_string(),
      port:             3001,
      store_path:       PathBuf::from("taleweave.db"),
      frontend_url:     None,
      line_window_secs: 60,
      lines_per_window: 1,
      blocked_words:    Vec::new(),
      allowed_words:    Vec::new(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("line_window_secs must be greater than zero")]
  ZeroWindow,
  #[error("lines_per_window must be greater than zero")]
  ZeroBudget,
  #[error("frontend_url is not a valid origin: {0:?}")]
  InvalidOrigin(String),
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn line_window(&self) -> Duration {
    Duration::from_secs(self.line_window_secs)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.line_window_secs == 0 {
      return Err(ConfigError::ZeroWindow);
    }
    if self.lines_per_window == 0 {
      return Err(ConfigError::ZeroBudget);
    }
    self.cors_origin()?;
    Ok(())
  }

  fn cors_origin(&self) -> Result<Option<HeaderValue>, ConfigError> {
    self
      .frontend_url
      .as_deref()
      .map(|url| {
        HeaderValue::from_str(url.trim_end_matches('/'))
          .map_err(|_| ConfigError::InvalidOrigin(url.to_string()))
      })
      .transpose()
  }

  /// The profanity filter: built-in words, plus `blocked_words`, minus
  /// `allowed_words`.
  pub fn profanity_filter(&self) -> ProfanityFilter {
    let mut filter = ProfanityFilter::default();
    filter.add_words(&self.blocked_words);
    filter.remove_words(&self.allowed_words);
    filter
  }

  pub fn rate_limiter(&self) -> RateLimiter {
    RateLimiter::new(self.line_window(), self.lines_per_window)
  }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Build the contribution pipeline over `store`.
pub fn pipeline<S: StoryStore>(store: Arc<S>, config: &ServerConfig) -> Pipeline<S> {
  Pipeline::new(store, config.rate_limiter(), config.profanity_filter())
}

/// Build the top-level router: the API under `/api`, request tracing, and CORS
/// for `frontend_url` when set.
pub fn router<S>(
  pipeline: Arc<Pipeline<S>>,
  config: &ServerConfig,
) -> Result<Router, ConfigError>
where
  S: StoryStore + 'static,
{
  let mut app = Router::new()
    .nest("/api", taleweave_api::api_router(pipeline))
    .layer(TraceLayer::new_for_http());

  if let Some(origin) = config.cors_origin()? {
    let cors = CorsLayer::new()
      .allow_origin(origin)
      .allow_methods([Method::GET, Method::POST])
      .allow_headers([header::CONTENT_TYPE])
      .allow_credentials(true);
    app = app.layer(cors);
  }

  Ok(app)
}

// ─── Integration tests ────────────────────────────────────────────────────────
