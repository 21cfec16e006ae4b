//! Best-effort profanity filtering.
//!
//! Flagged words are masked in place; text is never rejected for containing
//! them. Matching is whole-word and case-insensitive over ASCII word
//! characters, so deliberate misspellings get through.

use std::collections::HashSet;

const PLACEHOLDER: char = '*';

/// Built-in word list. Extend or prune it with
/// [`ProfanityFilter::add_words`] and [`ProfanityFilter::remove_words`].
pub const DEFAULT_WORDS: &[&str] = &[
  "arse", "arsehole", "asshole", "asshat", "bastard", "bitch", "bitches",
  "bollocks", "bullshit", "clusterfuck", "cock", "cocksucker", "crap", "cunt",
  "damn", "dickhead", "dipshit", "douchebag", "dumbass", "fuck", "fucked",
  "fucker", "fucking", "goddamn", "horseshit", "jackass", "motherfucker",
  "piss", "pissed", "prick", "shit", "shitty", "slut", "twat", "wanker",
  "whore",
];

#[derive(Debug, Clone)]
pub struct ProfanityFilter {
  words: HashSet<String>,
}

impl Default for ProfanityFilter {
  fn default() -> Self { Self::with_words(DEFAULT_WORDS.iter().copied()) }
}

impl ProfanityFilter {
  /// A filter that flags exactly `words`.
  pub fn with_words<I, W>(words: I) -> Self
  where
    I: IntoIterator<Item = W>,
    W: AsRef<str>,
  {
    let mut filter = Self { words: HashSet::new() };
    filter.add_words(words);
    filter
  }

  pub fn add_words<I, W>(&mut self, words: I)
  where
    I: IntoIterator<Item = W>,
    W: AsRef<str>,
  {
    self
      .words
      .extend(words.into_iter().map(|w| w.as_ref().trim().to_lowercase()));
    self.words.remove("");
  }

  pub fn remove_words<I, W>(&mut self, words: I)
  where
    I: IntoIterator<Item = W>,
    W: AsRef<str>,
  {
    for w in words {
      self.words.remove(&w.as_ref().trim().to_lowercase());
    }
  }

  /// Whether any whole word in `text` is on the list.
  pub fn is_profane(&self, text: &str) -> bool {
    words_of(text).any(|w| self.is_flagged(w))
  }

  /// Return `text` with every flagged word masked character by character.
  /// Everything else, including whitespace and punctuation, is preserved.
  pub fn clean(&self, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
      match (is_word_char(c), word_start) {
        (true, None) => word_start = Some(i),
        (false, Some(start)) => {
          self.push_word(&mut out, &text[start..i]);
          word_start = None;
          out.push(c);
        }
        (false, None) => out.push(c),
        (true, Some(_)) => {}
      }
    }
    if let Some(start) = word_start {
      self.push_word(&mut out, &text[start..]);
    }

    out
  }

  fn push_word(&self, out: &mut String, word: &str) {
    if self.is_flagged(word) {
      out.extend(std::iter::repeat_n(PLACEHOLDER, word.chars().count()));
    } else {
      out.push_str(word);
    }
  }

  fn is_flagged(&self, word: &str) -> bool {
    self.words.contains(&word.to_ascii_lowercase())
  }
}

fn is_word_char(c: char) -> bool { c.is_ascii_alphanumeric() || c == '_' }

fn words_of(text: &str) -> impl Iterator<Item = &str> {
  text.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn masks_flagged_words_and_keeps_the_rest() {
    let f = ProfanityFilter::default();
    assert_eq!(f.clean("What the shit, Bob?"), "What the ****, Bob?");
  }

  #[test]
  fn matching_is_case_insensitive() {
    let f = ProfanityFilter::default();
    assert_eq!(f.clean("DAMN it."), "**** it.");
  }

  #[test]
  fn only_whole_words_match() {
    let f = ProfanityFilter::default();
    assert_eq!(f.clean("Scrapbook class assessment."), "Scrapbook class assessment.");
    assert!(!f.is_profane("Scrapbook"));
  }

  #[test]
  fn clean_text_is_unchanged() {
    let f = ProfanityFilter::default();
    let text = "Once upon a time, in a café far away...";
    assert_eq!(f.clean(text), text);
  }

  #[test]
  fn masked_text_keeps_its_length() {
    let f = ProfanityFilter::default();
    let text = "Oh crap! The bastard left.";
    assert_eq!(f.clean(text).chars().count(), text.chars().count());
  }

  #[test]
  fn custom_words_can_be_added_and_removed() {
    let mut f = ProfanityFilter::default();
    f.add_words(["Grobble"]);
    f.remove_words(["damn"]);
    assert_eq!(f.clean("grobble, damn."), "*******, damn.");
  }

  #[test]
  fn empty_words_are_ignored() {
    let f = ProfanityFilter::with_words(["", "  "]);
    assert_eq!(f.clean("a b"), "a b");
  }
}
