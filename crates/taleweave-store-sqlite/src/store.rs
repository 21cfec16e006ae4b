//! [`SqliteStore`], the SQLite implementation of [`StoryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use taleweave_core::{
  store::{Insertion, StoryStore},
  story::{NewLine, NewStory, Story, StoryLine, StorySummary},
};

use crate::{
  Result,
  encode::{
    LINE_COLUMNS, RawLine, RawStory, RawSummary, STORY_COLUMNS, encode_dt,
    encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Taleweave story store backed by a single SQLite file.
///
/// Clones share the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Whether `e` is the UNIQUE constraint on `stories.slug` rejecting a write.
fn is_slug_conflict(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, Some(msg))
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        && msg.contains("stories.slug")
  )
}

// ─── StoryStore impl ─────────────────────────────────────────────────────────

impl StoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Stories ───────────────────────────────────────────────────────────────

  async fn slug_exists(&self, slug: &str) -> Result<bool> {
    let slug = slug.to_owned();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM stories WHERE slug = ?1",
              rusqlite::params![slug],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(exists)
  }

  async fn insert_story(
    &self,
    input: NewStory,
  ) -> Result<Insertion<(Story, StoryLine)>> {
    let at = now();
    let story = Story {
      id:               Uuid::new_v4(),
      title:            input.title,
      slug:             input.slug,
      description:      input.description,
      starter_text:     input.starter_text,
      created_at:       at,
      last_activity_at: at,
      is_active:        true,
    };
    let starter = StoryLine {
      id:              Uuid::new_v4(),
      story_id:        story.id,
      text:            story.starter_text.clone(),
      timestamp:       at,
      ip_hash:         input.ip_hash,
      is_starter_text: true,
    };

    let story_id_str = encode_uuid(story.id);
    let line_id_str  = encode_uuid(starter.id);
    let at_str       = encode_dt(at);
    let title        = story.title.clone();
    let slug         = story.slug.clone();
    let description  = story.description.clone();
    let starter_text = story.starter_text.clone();
    let ip_hash      = starter.ip_hash.clone();

    let created = self
      .conn
      .call(move |conn| {
        // Dropping the transaction without committing rolls it back.
        let tx = conn.transaction()?;

        let inserted = tx.execute(
          "INSERT INTO stories (
             story_id, title, slug, description, starter_text,
             created_at, last_activity_at, is_active
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 1)",
          rusqlite::params![
            story_id_str,
            title,
            slug,
            description,
            starter_text,
            at_str,
          ],
        );
        match inserted {
          Err(e) if is_slug_conflict(&e) => return Ok(false),
          other => {
            other?;
          }
        }

        tx.execute(
          "INSERT INTO story_lines (
             line_id, story_id, text, timestamp, ip_hash, is_starter_text
           ) VALUES (?1, ?2, ?3, ?4, ?5, 1)",
          rusqlite::params![line_id_str, story_id_str, starter_text, at_str, ip_hash],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if created {
      Ok(Insertion::Created((story, starter)))
    } else {
      Ok(Insertion::SlugTaken)
    }
  }

  async fn find_active_story(&self, slug: &str) -> Result<Option<Story>> {
    let slug = slug.to_owned();

    let raw: Option<RawStory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {STORY_COLUMNS} FROM stories WHERE slug = ?1 AND is_active = 1"
              ),
              rusqlite::params![slug],
              RawStory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStory::into_story).transpose()
  }

  async fn list_active_stories(&self) -> Result<Vec<StorySummary>> {
    let raws: Vec<RawSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT title, slug, description, last_activity_at
           FROM stories
           WHERE is_active = 1
           ORDER BY last_activity_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSummary {
              title:            row.get(0)?,
              slug:             row.get(1)?,
              description:      row.get(2)?,
              last_activity_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn set_story_active(&self, slug: &str, active: bool) -> Result<bool> {
    let slug = slug.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE stories SET is_active = ?2 WHERE slug = ?1",
          rusqlite::params![slug, active],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn touch_story(&self, story_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(story_id);
    let at_str = encode_dt(at);

    // A single statement, so concurrent touches can never move it backwards.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE stories
           SET last_activity_at = MAX(last_activity_at, ?2)
           WHERE story_id = ?1",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Lines ─────────────────────────────────────────────────────────────────

  async fn append_line(&self, input: NewLine) -> Result<StoryLine> {
    let line = StoryLine {
      id:              Uuid::new_v4(),
      story_id:        input.story_id,
      text:            input.text,
      timestamp:       now(),
      ip_hash:         input.ip_hash,
      is_starter_text: false,
    };

    let line_id_str  = encode_uuid(line.id);
    let story_id_str = encode_uuid(line.story_id);
    let at_str       = encode_dt(line.timestamp);
    let text         = line.text.clone();
    let ip_hash      = line.ip_hash.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO story_lines (
             line_id, story_id, text, timestamp, ip_hash, is_starter_text
           ) VALUES (?1, ?2, ?3, ?4, ?5, 0)",
          rusqlite::params![line_id_str, story_id_str, text, at_str, ip_hash],
        )?;
        Ok(())
      })
      .await?;

    Ok(line)
  }

  async fn remove_line(&self, line_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(line_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM story_lines WHERE line_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn story_lines(&self, story_id: Uuid) -> Result<Vec<StoryLine>> {
    let id_str = encode_uuid(story_id);

    let raws: Vec<RawLine> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LINE_COLUMNS}
           FROM story_lines
           WHERE story_id = ?1
           ORDER BY timestamp ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawLine::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLine::into_line).collect()
  }
}
