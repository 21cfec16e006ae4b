//! Story and line records.
//!
//! A story is created together with its starter line and is never edited
//! afterwards, except for `last_activity_at` and `is_active`. Lines are
//! append-only and owned by exactly one story.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Limits ──────────────────────────────────────────────────────────────────

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
/// Applies to both the starter text and every contributed line.
pub const MAX_LINE_CHARS: usize = 280;

// ─── Story ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
  pub id:               Uuid,
  pub title:            String,
  /// Unique across all stories, active or not. Never changes.
  pub slug:             String,
  pub description:      String,
  pub starter_text:     String,
  pub created_at:       DateTime<Utc>,
  /// Moves forward every time a line is appended; never moves backwards.
  pub last_activity_at: DateTime<Utc>,
  /// Hidden stories are excluded from listing and lookup.
  pub is_active:        bool,
}

/// The listing projection of a [`Story`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
  pub title:            String,
  pub slug:             String,
  pub description:      String,
  pub last_activity_at: DateTime<Utc>,
}

impl From<&Story> for StorySummary {
  fn from(s: &Story) -> Self {
    Self {
      title:            s.title.clone(),
      slug:             s.slug.clone(),
      description:      s.description.clone(),
      last_activity_at: s.last_activity_at,
    }
  }
}

// ─── StoryLine ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryLine {
  pub id:              Uuid,
  pub story_id:        Uuid,
  pub text:            String,
  /// Server-assigned; lines are ordered by it.
  pub timestamp:       DateTime<Utc>,
  /// SHA-256 of the contributor's address. Stored for abuse tracking, never
  /// sent back to clients.
  #[serde(skip_serializing, default)]
  pub ip_hash:         String,
  pub is_starter_text: bool,
}

/// A story together with all of its lines, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryWithLines {
  pub story: Story,
  pub lines: Vec<StoryLine>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::StoryStore::insert_story`].
///
/// All text is already trimmed and moderated. The store assigns ids and
/// timestamps and writes the starter line from `starter_text` in the same
/// transaction as the story.
#[derive(Debug, Clone)]
pub struct NewStory {
  pub title:        String,
  pub slug:         String,
  pub description:  String,
  pub starter_text: String,
  /// Attribution for the starter line.
  pub ip_hash:      String,
}

/// Input to [`crate::store::StoryStore::append_line`].
/// `timestamp` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewLine {
  pub story_id: Uuid,
  pub text:     String,
  pub ip_hash:  String,
}

/// Raw, unvalidated story fields as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDraft {
  pub title:        Option<String>,
  pub description:  Option<String>,
  pub starter_text: Option<String>,
}
