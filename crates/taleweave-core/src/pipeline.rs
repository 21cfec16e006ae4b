//! The contribution pipeline: every story creation and line addition runs
//! through here.
//!
//! Each operation is a sequence of checks; the first failing check returns
//! its error and nothing is written.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
  Error, Result,
  identity::hash_ip,
  limiter::{Budget, Decision, RateLimiter},
  moderation::ProfanityFilter,
  slug::{candidate, create_slug},
  store::{Insertion, StoryStore},
  story::{
    MAX_DESCRIPTION_CHARS, MAX_LINE_CHARS, MAX_TITLE_CHARS, NewLine, NewStory,
    Story, StoryDraft, StoryLine, StorySummary, StoryWithLines,
  },
  text::count_sentences,
};

/// Times one candidate slug may be reported taken while no story visibly
/// holds it before creation gives up.
pub const MAX_SLUG_RACES: u32 = 8;

const STARTER_SENTENCES: std::ops::RangeInclusive<usize> = 1..=3;
const LINE_SENTENCES: std::ops::RangeInclusive<usize> = 1..=2;

pub struct Pipeline<S> {
  store:   Arc<S>,
  limiter: RateLimiter,
  filter:  ProfanityFilter,
}

impl<S: StoryStore> Pipeline<S> {
  pub fn new(store: Arc<S>, limiter: RateLimiter, filter: ProfanityFilter) -> Self {
    Self { store, limiter, filter }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn limiter(&self) -> &RateLimiter { &self.limiter }

  // ── Create ────────────────────────────────────────────────────────────

  /// Create a story and its starter line on behalf of `client` (the raw
  /// network address; only its hash is stored).
  pub async fn create_story(
    &self,
    draft: StoryDraft,
    client: &str,
  ) -> Result<(Story, StoryLine)> {
    let (Some(title), Some(description), Some(starter_text)) = (
      non_blank(draft.title),
      non_blank(draft.description),
      non_blank(draft.starter_text),
    ) else {
      return Err(Error::MissingStoryFields);
    };

    let sentences = count_sentences(&starter_text);
    if !STARTER_SENTENCES.contains(&sentences) {
      return Err(Error::StarterSentences(sentences));
    }

    check_len("Title", &title, MAX_TITLE_CHARS)?;
    check_len("Description", &description, MAX_DESCRIPTION_CHARS)?;
    check_len("Starter text", &starter_text, MAX_LINE_CHARS)?;

    let base = create_slug(&title);
    let title = self.filter.clean(&title);
    let description = self.filter.clean(&description);
    let starter_text = self.filter.clean(&starter_text);
    let ip_hash = hash_ip(client);

    let mut attempt = 0;
    let mut races = 0;
    loop {
      let slug = candidate(&base, attempt);

      if self.store.slug_exists(&slug).await.map_err(Error::store)? {
        attempt += 1;
        races = 0;
        continue;
      }

      let input = NewStory {
        title:        title.clone(),
        slug:         slug.clone(),
        description:  description.clone(),
        starter_text: starter_text.clone(),
        ip_hash:      ip_hash.clone(),
      };

      match self.store.insert_story(input).await.map_err(Error::store)? {
        Insertion::Created((story, starter)) => {
          info!(story_id = %story.id, slug = %story.slug, "story created");
          return Ok((story, starter));
        }
        Insertion::SlugTaken => {
          races += 1;
          debug!(%slug, races, "slug claimed concurrently, checking again");
          if races >= MAX_SLUG_RACES {
            return Err(Error::SlugConflict(base));
          }
        }
      }
    }
  }

  // ── Append ────────────────────────────────────────────────────────────

  /// Append a line to the active story `slug` on behalf of `client`.
  ///
  /// `text` is `None` when the client sent no usable text at all. Returns
  /// the stored line and the client's remaining submission budget.
  pub async fn add_line(
    &self,
    slug: &str,
    text: Option<String>,
    client: &str,
  ) -> Result<(StoryLine, Budget)> {
    let budget = match self.limiter.check(client) {
      Decision::Allowed(budget) => budget,
      Decision::Limited { retry_after } => {
        debug!(%slug, ?retry_after, "line submission throttled");
        return Err(Error::RateLimited {
          message: format!(
            "Please wait {} before adding another line",
            self.limiter.describe_window()
          ),
          retry_after,
          limit: self.limiter.limit(),
        });
      }
    };

    let story = self
      .store
      .find_active_story(slug)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::StoryNotFound(slug.to_owned()))?;

    let text = text
      .filter(|t| !t.trim().is_empty())
      .ok_or(Error::MissingText)?;

    let len = text.chars().count();
    if len > MAX_LINE_CHARS {
      return Err(Error::TextTooLong { len, max: MAX_LINE_CHARS });
    }

    let sentences = count_sentences(&text);
    if !LINE_SENTENCES.contains(&sentences) {
      return Err(Error::LineSentences(sentences));
    }

    let text = text.trim();
    if self.filter.is_profane(text) {
      debug!(%slug, "masking profanity in line");
    }

    let line = self
      .store
      .append_line(NewLine {
        story_id: story.id,
        text:     self.filter.clean(text),
        ip_hash:  hash_ip(client),
      })
      .await
      .map_err(Error::store)?;

    self.propagate_activity(&line).await?;

    info!(
      story_id = %story.id,
      line_id = %line.id,
      remaining = budget.remaining,
      "line added",
    );
    Ok((line, budget))
  }

  /// Move the parent story's `last_activity_at` up to the line's timestamp,
  /// removing the line again if that fails.
  async fn propagate_activity(&self, line: &StoryLine) -> Result<()> {
    let err = match self.store.touch_story(line.story_id, line.timestamp).await {
      Ok(true) => return Ok(()),
      Ok(false) => Error::StoryNotFound(line.story_id.to_string()),
      Err(e) => Error::store(e),
    };

    if let Err(undo) = self.store.remove_line(line.id).await {
      error!(
        line_id = %line.id,
        story_id = %line.story_id,
        error = %undo,
        "failed to remove line after activity update failed",
      );
    }
    Err(err)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Active stories, most recently active first.
  pub async fn list_stories(&self) -> Result<Vec<StorySummary>> {
    self.store.list_active_stories().await.map_err(Error::store)
  }

  /// An active story with all of its lines, oldest first.
  pub async fn get_story(&self, slug: &str) -> Result<StoryWithLines> {
    let story = self
      .store
      .find_active_story(slug)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::StoryNotFound(slug.to_owned()))?;

    let lines = self.store.story_lines(story.id).await.map_err(Error::store)?;
    Ok(StoryWithLines { story, lines })
  }

  // ── Visibility ────────────────────────────────────────────────────────

  /// Show or hide a story. Hidden stories keep their slug reserved.
  pub async fn set_story_active(&self, slug: &str, active: bool) -> Result<()> {
    let found = self
      .store
      .set_story_active(slug, active)
      .await
      .map_err(Error::store)?;
    if !found {
      return Err(Error::StoryNotFound(slug.to_owned()));
    }
    info!(%slug, active, "story visibility changed");
    Ok(())
  }
}

fn non_blank(field: Option<String>) -> Option<String> {
  field
    .map(|f| f.trim().to_owned())
    .filter(|f| !f.is_empty())
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
  if value.chars().count() > max {
    return Err(Error::FieldTooLong { field, max });
  }
  Ok(())
}
