//! JSON REST API for Taleweave.
//!
//! Exposes an axum [`Router`] backed by a [`Pipeline`] over any
//! [`taleweave_core::store::StoryStore`]. TLS, CORS, and request tracing are
//! the caller's responsibility.
//!
//! The rate limiter keys on [`ClientAddress`], which falls back to the peer
//! address only when the server is started with
//! `into_make_service_with_connect_info::<SocketAddr>()`.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", taleweave_api::api_router(pipeline.clone()))
//! ```

pub mod client;
pub mod error;
pub mod stories;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use taleweave_core::{Pipeline, store::StoryStore};

pub use client::ClientAddress;
pub use error::ApiError;

/// Build a fully-materialised API router for `pipeline`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(pipeline: Arc<Pipeline<S>>) -> Router<()>
where
  S: StoryStore + 'static,
{
  Router::new()
    .route("/stories", get(stories::list::<S>).post(stories::create::<S>))
    .route("/stories/{slug}", get(stories::get_one::<S>))
    .route("/stories/{slug}/lines", post(stories::add_line::<S>))
    .with_state(pipeline)
}

// ─── Integration tests ────────────────────────────────────────────────────────
