//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that string comparison in SQL matches
//! chronological order. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use taleweave_core::story::{Story, StoryLine, StorySummary};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawStory`]'s field order.
pub const STORY_COLUMNS: &str = "story_id, title, slug, description, starter_text, \
                                 created_at, last_activity_at, is_active";

/// Raw values read directly from a `stories` row.
pub struct RawStory {
  pub story_id:         String,
  pub title:            String,
  pub slug:             String,
  pub description:      String,
  pub starter_text:     String,
  pub created_at:       String,
  pub last_activity_at: String,
  pub is_active:        bool,
}

impl RawStory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      story_id:         row.get(0)?,
      title:            row.get(1)?,
      slug:             row.get(2)?,
      description:      row.get(3)?,
      starter_text:     row.get(4)?,
      created_at:       row.get(5)?,
      last_activity_at: row.get(6)?,
      is_active:        row.get(7)?,
    })
  }

  pub fn into_story(self) -> Result<Story> {
    Ok(Story {
      id:               decode_uuid(&self.story_id)?,
      title:            self.title,
      slug:             self.slug,
      description:      self.description,
      starter_text:     self.starter_text,
      created_at:       decode_dt(&self.created_at)?,
      last_activity_at: decode_dt(&self.last_activity_at)?,
      is_active:        self.is_active,
    })
  }
}

/// Raw values for the listing projection.
pub struct RawSummary {
  pub title:            String,
  pub slug:             String,
  pub description:      String,
  pub last_activity_at: String,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<StorySummary> {
    Ok(StorySummary {
      title:            self.title,
      slug:             self.slug,
      description:      self.description,
      last_activity_at: decode_dt(&self.last_activity_at)?,
    })
  }
}

/// Column list matching [`RawLine`]'s field order.
pub const LINE_COLUMNS: &str =
  "line_id, story_id, text, timestamp, ip_hash, is_starter_text";

/// Raw values read directly from a `story_lines` row.
pub struct RawLine {
  pub line_id:         String,
  pub story_id:        String,
  pub text:            String,
  pub timestamp:       String,
  pub ip_hash:         String,
  pub is_starter_text: bool,
}

impl RawLine {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      line_id:         row.get(0)?,
      story_id:        row.get(1)?,
      text:            row.get(2)?,
      timestamp:       row.get(3)?,
      ip_hash:         row.get(4)?,
      is_starter_text: row.get(5)?,
    })
  }

  pub fn into_line(self) -> Result<StoryLine> {
    Ok(StoryLine {
      id:              decode_uuid(&self.line_id)?,
      story_id:        decode_uuid(&self.story_id)?,
      text:            self.text,
      timestamp:       decode_dt(&self.timestamp)?,
      ip_hash:         self.ip_hash,
      is_starter_text: self.is_starter_text,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width() {
    let whole = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let fractional = whole + chrono::Duration::microseconds(1500);
    assert_eq!(encode_dt(whole), "2024-05-01T12:00:00.000000Z");
    assert_eq!(encode_dt(fractional), "2024-05-01T12:00:00.001500Z");
    assert!(encode_dt(whole) < encode_dt(fractional));
  }

  #[test]
  fn now_survives_a_round_trip() {
    let t = now();
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
  }

  #[test]
  fn bad_date_is_an_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
