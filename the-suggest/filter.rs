//! Substring filtering and deterministic ranking of normalized suggestions.

use std::cmp::Ordering;

use crate::source::InternalSuggestion;

struct Candidate<'a> {
  item:   &'a InternalSuggestion,
  offset: usize,
}

/// Filter `normalized` down to the entries matching `query` and rank them.
///
/// An empty query with `open_on_focus` set yields the whole list in source
/// order. Otherwise an entry matches when its lowercase match text contains
/// the lowercase query. Matches at offset 0 come first; everything else is
/// ordered by raw value, then by a case-folded collation of the match text.
/// The sort is stable, so identical entries keep source order.
pub fn filter_and_rank(
  normalized: &[InternalSuggestion],
  query: &str,
  open_on_focus: bool,
) -> Vec<InternalSuggestion> {
  if query.is_empty() && open_on_focus {
    return normalized.to_vec();
  }

  let needle = query.to_lowercase();
  let mut candidates: Vec<Candidate> = normalized
    .iter()
    .filter_map(|item| {
      item
        .match_text()
        .to_lowercase()
        .find(&needle)
        .map(|offset| Candidate { item, offset })
    })
    .collect();

  candidates.sort_by(compare_candidates);
  candidates
    .into_iter()
    .map(|candidate| candidate.item.clone())
    .collect()
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
  let a_prefix = a.offset == 0;
  let b_prefix = b.offset == 0;
  b_prefix
    .cmp(&a_prefix)
    .then_with(|| a.item.value.cmp(&b.item.value))
    .then_with(|| collate(a.item.match_text(), b.item.match_text()))
}

fn collate(a: &str, b: &str) -> Ordering {
  a.to_lowercase()
    .cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}
