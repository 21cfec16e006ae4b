//! The `StoryStore` trait.
//!
//! Implemented by storage backends (e.g. `taleweave-store-sqlite`). The
//! pipeline depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::story::{NewLine, NewStory, Story, StoryLine, StorySummary};

/// Outcome of an insert guarded by the unique slug constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion<T> {
  Created(T),
  /// Another story already holds the slug; nothing was written.
  SlugTaken,
}

/// Abstraction over a Taleweave story store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait StoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Stories ───────────────────────────────────────────────────────────

  /// Whether any story, active or hidden, already uses `slug`.
  fn slug_exists<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Persist a story and its starter line atomically.
  ///
  /// Returns [`Insertion::SlugTaken`] when the slug's uniqueness constraint
  /// rejects the insert. Either both records are written or neither is.
  fn insert_story(
    &self,
    input: NewStory,
  ) -> impl Future<Output = Result<Insertion<(Story, StoryLine)>, Self::Error>>
  + Send
  + '_;

  /// Retrieve an active story by slug. Hidden stories yield `None`.
  fn find_active_story<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Story>, Self::Error>> + Send + 'a;

  /// All active stories, most recently active first.
  fn list_active_stories(
    &self,
  ) -> impl Future<Output = Result<Vec<StorySummary>, Self::Error>> + Send + '_;

  /// Set the visibility flag on the story with `slug`, whatever its current
  /// state. Returns `false` if no such story exists.
  fn set_story_active<'a>(
    &'a self,
    slug: &'a str,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Move `last_activity_at` forward to `at`. An older `at` leaves the value
  /// unchanged. Returns `false` if the story does not exist.
  fn touch_story(
    &self,
    story_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Lines ─────────────────────────────────────────────────────────────

  /// Append a regular (non-starter) line. The timestamp is set by the store.
  fn append_line(
    &self,
    input: NewLine,
  ) -> impl Future<Output = Result<StoryLine, Self::Error>> + Send + '_;

  /// Remove a line. Only used to undo an append whose follow-up write failed.
  fn remove_line(
    &self,
    line_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All lines of a story, oldest first.
  fn story_lines(
    &self,
    story_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StoryLine>, Self::Error>> + Send + '_;
}
