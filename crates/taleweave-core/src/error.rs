//! Error types for `taleweave-core`.
//!
//! The `Display` form of every variant except [`Error::Store`] is the message
//! shown to the contributor.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Title, description, and starter text are required")]
  MissingStoryFields,

  #[error("Starter text must contain 1-3 sentences")]
  StarterSentences(usize),

  #[error("{field} must be at most {max} characters")]
  FieldTooLong { field: &'static str, max: usize },

  #[error("Story not found")]
  StoryNotFound(String),

  #[error("Text is required")]
  MissingText,

  #[error("Text exceeds maximum length of {max} characters")]
  TextTooLong { len: usize, max: usize },

  #[error("Your contribution must be 1-2 sentences")]
  LineSentences(usize),

  #[error("{message}")]
  RateLimited {
    message:     String,
    retry_after: Duration,
    /// Lines admitted per window.
    limit:       u32,
  },

  /// Every candidate slug was claimed by a concurrent insert.
  #[error("Another story with this title was created at the same time, please try again")]
  SlugConflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
