use std::io::Write;

use eyre::Result;
use the_suggest::{
  SourceItem,
  filter_and_rank,
  normalize,
};

/// Print the ranked matches for `query`, one JSON object per line.
pub fn run(
  source: &[SourceItem],
  query: &str,
  open_on_focus: bool,
  out: &mut impl Write,
) -> Result<()> {
  let normalized = normalize(Some(source)).unwrap_or_default();
  let ranked = filter_and_rank(&normalized, query, open_on_focus);
  log::debug!("{} of {} entries match {query:?}", ranked.len(), normalized.len());
  for item in &ranked {
    serde_json::to_writer(&mut *out, item)?;
    writeln!(out)?;
  }
  Ok(())
}
