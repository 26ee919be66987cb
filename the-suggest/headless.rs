//! In-memory collaborators.
//!
//! These back the test suite and the command line driver, and double as a
//! reference for hosts wiring the engine to a real toolkit.

use std::{
  cell::{
    Cell,
    RefCell,
  },
  collections::HashMap,
  rc::Rc,
};

use crate::{
  collab::{
    Positioning,
    SuggestionList,
  },
  config::Alignment,
  source::InternalSuggestion,
  target::{
    Accessibility,
    Container,
    Listeners,
    Target,
    TargetRef,
    TargetValue,
  },
};

const MAX_VISIBLE_ITEMS: usize = 10;

/// A plain text field.
#[derive(Debug, Default)]
pub struct TextInput {
  value:         TargetValue,
  listeners:     Listeners,
  focus_count:   usize,
  input_signals: usize,
  accessibility: Option<Accessibility>,
}

impl TextInput {
  pub fn new(value: impl Into<TargetValue>) -> Self {
    Self {
      value: value.into(),
      ..Self::default()
    }
  }

  pub fn shared(value: impl Into<TargetValue>) -> Rc<RefCell<Self>> {
    Rc::new(RefCell::new(Self::new(value)))
  }

  /// Change the value the way a user edit would, without raising signals.
  pub fn set_raw_value(&mut self, value: impl Into<TargetValue>) {
    self.value = value.into();
  }

  pub fn value_text(&self) -> String {
    self.value.coerce()
  }

  pub fn listeners(&self) -> Listeners {
    self.listeners
  }

  pub fn is_listening(&self, listeners: Listeners) -> bool {
    self.listeners.contains(listeners)
  }

  pub fn focus_count(&self) -> usize {
    self.focus_count
  }

  pub fn input_signals(&self) -> usize {
    self.input_signals
  }

  pub fn accessibility(&self) -> Option<&Accessibility> {
    self.accessibility.as_ref()
  }
}

impl Target for TextInput {
  fn value(&self) -> TargetValue {
    self.value.clone()
  }

  fn set_value(&mut self, value: &str) {
    self.value = TargetValue::from(value);
  }

  fn notify_input(&mut self) {
    self.input_signals += 1;
  }

  fn focus(&mut self) {
    self.focus_count += 1;
  }

  fn listen(&mut self, listeners: Listeners) {
    self.listeners.insert(listeners);
  }

  fn unlisten(&mut self, listeners: Listeners) {
    self.listeners.remove(listeners);
  }

  fn set_accessibility(&mut self, accessibility: Option<&Accessibility>) {
    self.accessibility = accessibility.cloned();
  }
}

/// Id-addressable container of targets.
#[derive(Default)]
pub struct ElementRegistry {
  targets:           RefCell<HashMap<String, TargetRef>>,
  outside_listeners: Cell<usize>,
}

impl ElementRegistry {
  pub fn insert(&self, id: impl Into<String>, target: TargetRef) {
    self.targets.borrow_mut().insert(id.into(), target);
  }

  pub fn remove(&self, id: &str) -> Option<TargetRef> {
    self.targets.borrow_mut().remove(id)
  }

  pub fn is_listening_outside(&self) -> bool {
    self.outside_listeners.get() > 0
  }
}

impl Container for ElementRegistry {
  fn lookup_target(&self, id: &str) -> Option<TargetRef> {
    self.targets.borrow().get(id).cloned()
  }

  fn listen_outside_pointer(&self) {
    self.outside_listeners.set(self.outside_listeners.get() + 1);
  }

  fn unlisten_outside_pointer(&self) {
    self
      .outside_listeners
      .set(self.outside_listeners.get().saturating_sub(1));
  }
}

/// Scrolling list with a wrapping highlight.
#[derive(Debug, Clone, Default)]
pub struct MenuList {
  items:       Vec<InternalSuggestion>,
  highlighted: Option<usize>,
  selected:    Option<usize>,
  scroll:      usize,
}

impl MenuList {
  pub fn items(&self) -> &[InternalSuggestion] {
    &self.items
  }

  pub fn highlighted_item(&self) -> Option<&InternalSuggestion> {
    self.highlighted.and_then(|index| self.items.get(index))
  }

  /// Items inside the scroll window.
  pub fn visible(&self) -> &[InternalSuggestion] {
    let end = self
      .scroll
      .saturating_add(MAX_VISIBLE_ITEMS)
      .min(self.items.len());
    &self.items[self.scroll.min(end)..end]
  }

  pub fn scroll(&self) -> usize {
    self.scroll
  }

  /// Record a direct pick, as a pointer press on a row would.
  pub fn select(&mut self, index: usize) {
    if index < self.items.len() {
      self.selected = Some(index);
      self.highlighted = Some(index);
      self.clamp();
    }
  }

  fn clamp(&mut self) {
    if self.items.is_empty() {
      self.highlighted = None;
      self.selected = None;
      self.scroll = 0;
      return;
    }

    if let Some(highlighted) = self.highlighted {
      let highlighted = highlighted.min(self.items.len() - 1);
      self.highlighted = Some(highlighted);
      if highlighted < self.scroll {
        self.scroll = highlighted;
      } else {
        let visible_end = self
          .scroll
          .saturating_add(MAX_VISIBLE_ITEMS)
          .saturating_sub(1);
        if highlighted > visible_end {
          self.scroll = highlighted + 1 - MAX_VISIBLE_ITEMS;
        }
      }
    }

    let max_scroll = self.items.len().saturating_sub(MAX_VISIBLE_ITEMS);
    self.scroll = self.scroll.min(max_scroll);
  }
}

impl SuggestionList for MenuList {
  fn set_items(&mut self, items: &[InternalSuggestion]) {
    self.items = items.to_vec();
    self.highlighted = None;
    self.selected = None;
    self.scroll = 0;
  }

  fn highlight_next(&mut self) {
    if self.items.is_empty() {
      return;
    }
    let next = match self.highlighted {
      None => 0,
      Some(current) if current + 1 >= self.items.len() => 0,
      Some(current) => current + 1,
    };
    self.highlighted = Some(next);
    self.clamp();
  }

  fn highlight_previous(&mut self) {
    if self.items.is_empty() {
      return;
    }
    let previous = match self.highlighted {
      None | Some(0) => self.items.len() - 1,
      Some(current) => current - 1,
    };
    self.highlighted = Some(previous);
    self.clamp();
  }

  fn highlighted(&self) -> Option<usize> {
    self.highlighted
  }

  fn selected_index(&self) -> Option<usize> {
    self.selected
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionCall {
  Open(Alignment),
  Close,
  Refit,
  NotifyResize,
}

/// Positioner that only records what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct RecordingPositioner {
  pub calls: Vec<PositionCall>,
  open:      bool,
}

impl RecordingPositioner {
  pub fn is_open(&self) -> bool {
    self.open
  }

  pub fn count(&self, call: PositionCall) -> usize {
    self.calls.iter().filter(|recorded| **recorded == call).count()
  }
}

impl Positioning for RecordingPositioner {
  fn open(&mut self, _anchor: Option<TargetRef>, alignment: Alignment) {
    self.open = true;
    self.calls.push(PositionCall::Open(alignment));
  }

  fn close(&mut self) {
    self.open = false;
    self.calls.push(PositionCall::Close);
  }

  fn refit(&mut self) {
    self.calls.push(PositionCall::Refit);
  }

  fn notify_resize(&mut self) {
    self.calls.push(PositionCall::NotifyResize);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::{
    SourceItem,
    normalize,
  };

  fn items(count: usize) -> Vec<InternalSuggestion> {
    let source: Vec<SourceItem> = (0..count)
      .map(|index| SourceItem::from(format!("item {index}")))
      .collect();
    normalize(Some(&source)).unwrap()
  }

  #[test]
  fn highlight_starts_at_the_edges() {
    let mut list = MenuList::default();
    list.set_items(&items(3));
    list.highlight_next();
    assert_eq!(list.highlighted(), Some(0));

    list.set_items(&items(3));
    list.highlight_previous();
    assert_eq!(list.highlighted(), Some(2));
  }

  #[test]
  fn highlight_wraps() {
    let mut list = MenuList::default();
    list.set_items(&items(2));
    list.highlight_next();
    list.highlight_next();
    list.highlight_next();
    assert_eq!(list.highlighted(), Some(0));
    list.highlight_previous();
    assert_eq!(list.highlighted(), Some(1));
  }

  #[test]
  fn scroll_follows_highlight() {
    let mut list = MenuList::default();
    list.set_items(&items(25));
    list.highlight_previous();
    assert_eq!(list.highlighted(), Some(24));
    assert_eq!(list.scroll(), 15);
    assert_eq!(list.visible().len(), MAX_VISIBLE_ITEMS);
    assert_eq!(list.visible()[9].value, "item 24");

    list.highlight_next();
    assert_eq!(list.scroll(), 0);
  }

  #[test]
  fn empty_list_ignores_navigation() {
    let mut list = MenuList::default();
    list.highlight_next();
    list.highlight_previous();
    assert_eq!(list.highlighted(), None);
    assert!(list.visible().is_empty());
  }

  #[test]
  fn registry_counts_outside_subscriptions() {
    let registry = ElementRegistry::default();
    registry.listen_outside_pointer();
    assert!(registry.is_listening_outside());
    registry.unlisten_outside_pointer();
    assert!(!registry.is_listening_outside());
  }
}
