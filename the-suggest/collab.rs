//! Collaborators the engine drives but does not implement.

use crate::{
  config::Alignment,
  source::InternalSuggestion,
  target::TargetRef,
};

/// Places the floating panel. All geometry lives behind this trait.
pub trait Positioning {
  fn open(&mut self, anchor: Option<TargetRef>, alignment: Alignment);
  fn close(&mut self);
  /// Recompute placement against the current anchor.
  fn refit(&mut self);
  /// The panel content changed size.
  fn notify_resize(&mut self);
}

/// The list presenting suggestions and tracking the highlight.
///
/// Indices refer to positions in the most recent `set_items` slice. The
/// list's own selection-changed signal is routed back to the engine by the
/// host (`Autocomplete::on_list_selection`).
pub trait SuggestionList {
  /// Replace the displayed items. Implementations drop any highlight.
  fn set_items(&mut self, items: &[InternalSuggestion]);
  /// Move the highlight forward; with nothing highlighted this lands on the
  /// first item.
  fn highlight_next(&mut self);
  /// Move the highlight backward; with nothing highlighted this lands on the
  /// last item.
  fn highlight_previous(&mut self);
  fn highlighted(&self) -> Option<usize>;
  /// Item the user picked directly (pointer or touch), if any.
  fn selected_index(&self) -> Option<usize>;
}
