//! Handlers for `/stories` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stories` | Active stories, most recently active first |
//! | `POST` | `/stories` | Body: `{"title","description","starterText"}`; returns 201 |
//! | `GET`  | `/stories/{slug}` | Story plus lines, oldest first; 404 if unknown or hidden |
//! | `POST` | `/stories/{slug}/lines` | Body: `{"text"}`; returns 201 with `RateLimit-*` headers; throttled per client |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use serde::Serialize;
use serde_json::Value;
use taleweave_core::{
  Pipeline,
  store::StoryStore,
  story::{Story, StoryDraft, StoryLine, StorySummary, StoryWithLines},
};

use crate::{
  client::ClientAddress,
  error::{ApiError, insert_ratelimit_headers},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /stories`
pub async fn list<S>(
  State(pipeline): State<Arc<Pipeline<S>>>,
) -> Result<Json<Vec<StorySummary>>, ApiError>
where
  S: StoryStore,
{
  let stories = pipeline
    .list_stories()
    .await
    .map_err(|e| ApiError::from_core(e, "Failed to fetch stories"))?;
  Ok(Json(stories))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedStory {
  pub story:        Story,
  pub starter_line: StoryLine,
}

/// `POST /stories`: returns 201 with the story and its starter line.
///
/// A body that is not a JSON object of strings is treated as if every field
/// were missing.
pub async fn create<S>(
  State(pipeline): State<Arc<Pipeline<S>>>,
  client: ClientAddress,
  body: Result<Json<StoryDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StoryStore,
{
  let draft = body.map(|Json(d)| d).unwrap_or_default();
  let (story, starter_line) = pipeline
    .create_story(draft, client.as_str())
    .await
    .map_err(|e| ApiError::from_core(e, "Failed to create story"))?;
  Ok((StatusCode::CREATED, Json(CreatedStory { story, starter_line })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /stories/{slug}`
pub async fn get_one<S>(
  State(pipeline): State<Arc<Pipeline<S>>>,
  Path(slug): Path<String>,
) -> Result<Json<StoryWithLines>, ApiError>
where
  S: StoryStore,
{
  let story = pipeline
    .get_story(&slug)
    .await
    .map_err(|e| ApiError::from_core(e, "Failed to fetch story"))?;
  Ok(Json(story))
}

// ─── Add line ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LineAdded {
  pub success: bool,
  pub line:    StoryLine,
}

/// `POST /stories/{slug}/lines`, body `{"text":"..."}`; returns 201.
pub async fn add_line<S>(
  State(pipeline): State<Arc<Pipeline<S>>>,
  Path(slug): Path<String>,
  client: ClientAddress,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StoryStore,
{
  // Missing, malformed, and non-string text all look the same to the
  // pipeline.
  let text = body
    .ok()
    .and_then(|Json(v)| v.get("text").and_then(Value::as_str).map(str::to_owned));

  let (line, budget) = pipeline
    .add_line(&slug, text, client.as_str())
    .await
    .map_err(|e| ApiError::from_core(e, "Failed to add line"))?;

  let mut headers = HeaderMap::new();
  insert_ratelimit_headers(
    &mut headers,
    budget.limit,
    budget.remaining,
    budget.reset_after,
  );
  Ok((StatusCode::CREATED, headers, Json(LineAdded { success: true, line })))
}
