//! URL slugs derived from story titles.

/// Used when a title contains nothing slug-worthy (e.g. only punctuation).
pub const FALLBACK_SLUG: &str = "story";

/// Derive a URL-safe slug from `title`.
///
/// The result contains only `[a-z0-9-]`, never starts or ends with a hyphen
/// and never contains two hyphens in a row. Uniqueness is the pipeline's job.
pub fn create_slug(title: &str) -> String {
  let mut slug = String::with_capacity(title.len());
  let mut pending_hyphen = false;

  for c in title.to_lowercase().chars() {
    if c.is_ascii_lowercase() || c.is_ascii_digit() {
      if pending_hyphen && !slug.is_empty() {
        slug.push('-');
      }
      pending_hyphen = false;
      slug.push(c);
    } else if c.is_whitespace() || c == '-' {
      pending_hyphen = true;
    }
    // Anything else is dropped without splitting the surrounding word.
  }

  if slug.is_empty() {
    FALLBACK_SLUG.to_owned()
  } else {
    slug
  }
}

/// The `attempt`-th candidate for `base`: `base`, `base-1`, `base-2`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
  if attempt == 0 {
    base.to_owned()
  } else {
    format!("{base}-{attempt}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn is_well_formed(slug: &str) -> bool {
    !slug.is_empty()
      && slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
      && !slug.starts_with('-')
      && !slug.ends_with('-')
      && !slug.contains("--")
  }

  #[test]
  fn lowercases_and_hyphenates() {
    assert_eq!(create_slug("The Lost Lighthouse"), "the-lost-lighthouse");
  }

  #[test]
  fn strips_punctuation_inside_words() {
    assert_eq!(create_slug("Don't Panic!"), "dont-panic");
    assert_eq!(create_slug("snake_case title"), "snakecase-title");
  }

  #[test]
  fn collapses_runs_and_trims_edges() {
    assert_eq!(create_slug("  --Hello   --  World--  "), "hello-world");
    assert_eq!(create_slug("a - b"), "a-b");
  }

  #[test]
  fn keeps_digits() {
    assert_eq!(create_slug("2001: A Space Odyssey"), "2001-a-space-odyssey");
  }

  #[test]
  fn drops_non_ascii_letters() {
    assert_eq!(create_slug("Café Noir"), "caf-noir");
  }

  #[test]
  fn empty_result_falls_back() {
    assert_eq!(create_slug("!!!"), FALLBACK_SLUG);
    assert_eq!(create_slug(""), FALLBACK_SLUG);
  }

  #[test]
  fn output_is_always_well_formed() {
    let titles = [
      "Hello, World",
      "   leading and trailing   ",
      "--- dashes --- everywhere ---",
      "MiXeD CaSe 123",
      "émoji 🚀 title",
      "tabs\tand\nnewlines",
      "?",
    ];
    for title in titles {
      let slug = create_slug(title);
      assert!(is_well_formed(&slug), "{title:?} -> {slug:?}");
    }
  }

  #[test]
  fn candidates_are_suffixed_from_one() {
    assert_eq!(candidate("tale", 0), "tale");
    assert_eq!(candidate("tale", 1), "tale-1");
    assert_eq!(candidate("tale", 12), "tale-12");
  }
}
