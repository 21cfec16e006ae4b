//! Sentence counting for submitted text.
//!
//! This is a heuristic, not a grammar. Decimal numbers and uncommon
//! abbreviations will occasionally be miscounted.

/// Count sentence boundaries in `text`.
///
/// A boundary is a `.`, `!` or `?` followed by whitespace or the end of the
/// string. A `.` followed by more text is an abbreviation, not a boundary,
/// when it closes a short capitalised token (`Mr.`, `Dr.`) or the last part of
/// a dotted run in either case (`U.S.`, `e.g.`, `p.m.`). Consecutive
/// terminators (`?!`, `...`) count once.
pub fn count_sentences(text: &str) -> usize {
  let chars: Vec<char> = text.chars().collect();
  let mut count = 0;

  for (i, &c) in chars.iter().enumerate() {
    if !matches!(c, '.' | '!' | '?') {
      continue;
    }
    match chars.get(i + 1) {
      None => count += 1,
      Some(next) if next.is_whitespace() => {
        if c == '.' && ends_with_abbreviation(&chars[..i]) {
          continue;
        }
        count += 1;
      }
      Some(_) => {}
    }
  }

  count
}

/// Whether `before` ends in a token of one or two ASCII letters that is
/// either capitalised or preceded by another `.`.
fn ends_with_abbreviation(before: &[char]) -> bool {
  let letters = before
    .iter()
    .rev()
    .take_while(|c| c.is_ascii_alphabetic())
    .count();
  if !(1..=2).contains(&letters) {
    return false;
  }

  let start = before.len() - letters;
  match start.checked_sub(1).map(|i| before[i]) {
    Some('.') => true,
    Some(prev) if prev.is_alphanumeric() => false,
    _ => before[start].is_ascii_uppercase(),
  }
}
