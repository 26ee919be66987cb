//! The autocomplete engine.
//!
//! [`Autocomplete`] owns the query/visibility state and drives three
//! collaborators: a positioner for the floating panel, a list presenting the
//! suggestions, and whichever target it is currently bound to. Hosts forward
//! target signals (`on_input`, `on_focus`, `on_key`), pointer presses and
//! list picks, hand over sources with `set_source`, advance the deferred
//! clock with `advance`, and drain notifications.
//!
//! Hosts must not hold a borrow of the bound target while calling into the
//! engine; handlers read and write it.

use std::{
  rc::Rc,
  time::Duration,
};

use crate::{
  collab::{
    Positioning,
    SuggestionList,
  },
  config::AutocompleteConfig,
  event::{
    Notification,
    NotificationEvent,
    NotificationLog,
  },
  filter::filter_and_rank,
  input::{
    Key,
    KeyEvent,
    KeyOutcome,
  },
  schedule::{
    Latch,
    Scheduler,
  },
  source::{
    InternalSuggestion,
    SourceItem,
    normalize,
  },
  target::{
    ARIA_AUTOCOMPLETE,
    Accessibility,
    Container,
    PointerOrigin,
    TargetBinding,
    TargetRef,
    TargetSpec,
  },
  visibility::{
    Reason,
    Transition,
    Visibility,
    VisibilityMachine,
  },
};

/// Which end of the list a keyboard-triggered open highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
  First,
  Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
  Highlight(Edge),
  Refocus,
  ReleaseRefocusSuppression(u64),
  ReleaseFocusIgnore(u64),
}

#[derive(Debug, Clone, Default)]
pub struct EngineState {
  visibility:     VisibilityMachine,
  loading:        bool,
  previous_query: Option<String>,
  suggestions:    Vec<InternalSuggestion>,
}

impl EngineState {
  pub fn opened(&self) -> bool {
    self.visibility.is_open()
  }

  pub fn visibility(&self) -> Visibility {
    self.visibility.state()
  }

  pub fn loading(&self) -> bool {
    self.loading
  }

  /// The last query a refresh was requested for.
  pub fn previous_query(&self) -> Option<&str> {
    self.previous_query.as_deref()
  }

  /// Currently displayed suggestions, filtered and ranked.
  pub fn suggestions(&self) -> &[InternalSuggestion] {
    &self.suggestions
  }
}

pub struct Autocomplete<P, L> {
  config:             AutocompleteConfig,
  positioning:        P,
  list:               L,
  state:              EngineState,
  source:             Option<Rc<[SourceItem]>>,
  normalized:         Option<Vec<InternalSuggestion>>,
  /// Latest target value seen; what the displayed list is filtered by.
  query:              String,
  binding:            TargetBinding,
  container:          Option<Rc<dyn Container>>,
  scheduler:          Scheduler<Deferred>,
  notifications:      NotificationLog,
  refocus_suppressed: Latch,
  focus_ignored:      Latch,
  awaiting_source:    bool,
  pending_highlight:  Option<Edge>,
  /// Value written back by the last commit; its input echo is not a query.
  echo:               Option<String>,
}

impl<P: Positioning, L: SuggestionList> Autocomplete<P, L> {
  pub fn new(config: AutocompleteConfig, positioning: P, list: L) -> Self {
    Self {
      config,
      positioning,
      list,
      state: EngineState::default(),
      source: None,
      normalized: None,
      query: String::new(),
      binding: TargetBinding::default(),
      container: None,
      scheduler: Scheduler::new(),
      notifications: NotificationLog::default(),
      refocus_suppressed: Latch::default(),
      focus_ignored: Latch::default(),
      awaiting_source: false,
      pending_highlight: None,
      echo: None,
    }
  }

  pub fn config(&self) -> &AutocompleteConfig {
    &self.config
  }

  pub fn state(&self) -> &EngineState {
    &self.state
  }

  pub fn opened(&self) -> bool {
    self.state.opened()
  }

  pub fn loading(&self) -> bool {
    self.state.loading
  }

  pub fn suggestions(&self) -> &[InternalSuggestion] {
    &self.state.suggestions
  }

  pub fn source(&self) -> Option<&[SourceItem]> {
    self.source.as_deref()
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn positioning(&self) -> &P {
    &self.positioning
  }

  pub fn list(&self) -> &L {
    &self.list
  }

  /// Mutable access for hosts recording pointer picks on the list.
  pub fn list_mut(&mut self) -> &mut L {
    &mut self.list
  }

  pub fn target(&self) -> Option<TargetRef> {
    self.binding.current()
  }

  pub fn is_attached(&self) -> bool {
    self.container.is_some()
  }

  pub fn is_refocus_suppressed(&self) -> bool {
    self.refocus_suppressed.is_engaged()
  }

  pub fn is_focus_ignored(&self) -> bool {
    self.focus_ignored.is_engaged()
  }

  /// Current time on the deferred-work clock.
  pub fn now(&self) -> Duration {
    self.scheduler.now()
  }

  /// How long until the next deferred step is due, if any is queued.
  pub fn next_deferred_in(&self) -> Option<Duration> {
    self.scheduler.next_due_in()
  }

  pub fn drain_notifications(&mut self) -> Vec<NotificationEvent> {
    self.notifications.drain()
  }

  pub fn notifications_since(&self, seq: u64) -> Vec<NotificationEvent> {
    self.notifications.events_since(seq)
  }

  /// Connect to the owning container: resolves the target and starts
  /// watching for pointer presses outside the target and panel.
  pub fn attach(&mut self, container: Rc<dyn Container>) {
    if self.container.is_some() {
      self.detach();
    }
    container.listen_outside_pointer();
    self.container = Some(container);
    self.resolve_target();
  }

  /// Disconnect from the container, releasing every listener.
  pub fn detach(&mut self) {
    let Some(container) = self.container.take() else {
      return;
    };
    container.unlisten_outside_pointer();
    if let Some(released) = self.binding.detach() {
      released.borrow_mut().set_accessibility(None);
    }
    self.reset_query_state(Reason::Detached);
  }

  pub fn set_target(&mut self, spec: Option<TargetSpec>) {
    self.binding.set_spec(spec);
    self.resolve_target();
  }

  pub fn set_config(&mut self, config: AutocompleteConfig) {
    let disabling = config.disabled && !self.config.disabled;
    let rewire = config.no_target_controls != self.config.no_target_controls
      || config.panel_id != self.config.panel_id;
    self.config = config;
    if disabling {
      self.reset_query_state(Reason::Disabled);
    }
    if rewire {
      self.sync_accessibility();
    }
  }

  pub fn set_disabled(&mut self, disabled: bool) {
    if self.config.disabled == disabled {
      return;
    }
    self.config.disabled = disabled;
    if disabled {
      self.reset_query_state(Reason::Disabled);
    }
  }

  /// Replace the source. Normalization happens here, once per assignment.
  pub fn set_source(&mut self, source: Option<Rc<[SourceItem]>>) {
    self.normalized = normalize(source.as_deref());
    self.source = source;
    let was_loading = self.state.loading;
    self.set_loading(false);
    if self.config.disabled {
      return;
    }
    if self.awaiting_source || was_loading || self.state.opened() {
      self.awaiting_source = false;
      self.render();
      self.flush_pending_highlight();
    }
  }

  /// The bound target's value changed.
  pub fn on_input(&mut self) {
    if self.config.disabled {
      return;
    }
    let Some(target) = self.resolve_target() else {
      return;
    };
    let value = target.borrow().value().coerce();
    if let Some(echo) = self.echo.take()
      && echo == value
    {
      log::trace!("ignoring input echo of committed value");
      return;
    }
    self.run_query(value);
  }

  /// The bound target gained focus.
  pub fn on_focus(&mut self) {
    if self.config.disabled {
      return;
    }
    let Some(target) = self.resolve_target() else {
      return;
    };
    if self.focus_ignored.is_engaged() {
      log::trace!("ignoring focus restored by commit");
      return;
    }
    if self.config.open_on_focus {
      let value = target.borrow().value().coerce();
      self.run_query(value);
    }
  }

  /// Render against the target's current value, as a fresh query would.
  pub fn request_render(&mut self) {
    if self.config.disabled {
      return;
    }
    let value = match self.resolve_target() {
      Some(target) => target.borrow().value().coerce(),
      None => self.query.clone(),
    };
    self.run_query(value);
  }

  pub fn on_key(&mut self, event: KeyEvent) -> KeyOutcome {
    if self.config.disabled {
      return KeyOutcome::Continue;
    }
    let Some(target) = self.resolve_target() else {
      return KeyOutcome::Continue;
    };
    // Ctrl+Enter and friends belong to the host.
    if event.modifiers.is_chord()
      && matches!(event.key, Key::Down | Key::Up | Key::Enter | Key::NumpadEnter)
    {
      return KeyOutcome::Continue;
    }

    match event.key {
      Key::Down | Key::Up => {
        let edge = if event.key == Key::Down {
          Edge::First
        } else {
          Edge::Last
        };
        if self.state.opened() {
          match edge {
            Edge::First => self.list.highlight_next(),
            Edge::Last => self.list.highlight_previous(),
          }
        } else {
          self.pending_highlight = Some(edge);
          let value = target.borrow().value().coerce();
          self.run_query(value);
          self.flush_pending_highlight();
        }
        KeyOutcome::Handled
      },
      Key::Enter | Key::NumpadEnter => {
        if !self.state.opened() {
          return KeyOutcome::Continue;
        }
        let index = self.list.highlighted().unwrap_or(0);
        self.commit(index);
        KeyOutcome::Handled
      },
      Key::Tab => {
        if !self.state.opened() {
          return KeyOutcome::Continue;
        }
        self.dismiss(Reason::Tab);
        let generation = self.refocus_suppressed.engage();
        self.scheduler.schedule(
          self.config.refocus_grace(),
          Deferred::ReleaseRefocusSuppression(generation),
        );
        log::debug!("refocus suppressed for {:?}", self.config.refocus_grace());
        KeyOutcome::PassThrough
      },
      Key::Escape => {
        if !self.state.opened() {
          return KeyOutcome::Continue;
        }
        self.dismiss(Reason::Escape);
        KeyOutcome::PassThrough
      },
      _ => KeyOutcome::Continue,
    }
  }

  /// A pointer press somewhere in the container.
  pub fn on_pointer_down(&mut self, origin: PointerOrigin) {
    if self.container.is_none() || origin != PointerOrigin::Outside {
      return;
    }
    self.dismiss(Reason::OutsidePointer);
  }

  /// The list reported a direct pick.
  pub fn on_list_selection(&mut self) {
    if let Some(index) = self.list.selected_index() {
      self.commit(index);
    }
  }

  /// Commit the displayed suggestion at `selected_index`.
  ///
  /// Out-of-range indices and suggestions whose source entry is gone are
  /// ignored.
  pub fn commit(&mut self, selected_index: usize) {
    if self.config.disabled {
      return;
    }
    let Some((value, index)) = self
      .state
      .suggestions
      .get(selected_index)
      .map(|item| (item.value.clone(), item.index))
    else {
      log::trace!("commit index {selected_index} out of range");
      return;
    };
    let Some(original) = self
      .source
      .as_deref()
      .and_then(|source| source.get(index))
      .filter(|original| original.value() == Some(value.as_str()))
      .cloned()
    else {
      log::debug!("stale selection of source index {index}");
      return;
    };

    let target = self.binding.current();
    if !self.config.no_target_value_update
      && let Some(target) = &target
    {
      let mut target = target.borrow_mut();
      target.set_value(&value);
      self.echo = Some(value.clone());
      target.notify_input();
    }

    self.dismiss(Reason::Commit);
    log::debug!("committed suggestion {value:?} (source index {index})");
    self
      .notifications
      .push(Notification::Selected { item: original });

    if target.is_some() && !self.refocus_suppressed.is_engaged() {
      let generation = self.focus_ignored.engage();
      self.scheduler.schedule(Duration::ZERO, Deferred::Refocus);
      self.scheduler.schedule(
        self.config.focus_ignore_window(),
        Deferred::ReleaseFocusIgnore(generation),
      );
    }
  }

  /// Move the deferred clock forward, running every step that falls due,
  /// including zero-delay steps queued along the way.
  pub fn advance(&mut self, elapsed: Duration) {
    let until = self.scheduler.now() + elapsed;
    while let Some(task) = self.scheduler.pop_due(until) {
      self.run_deferred(task);
    }
    self.scheduler.settle(until);
  }

  /// Run zero-delay steps without moving the clock.
  pub fn run_pending(&mut self) {
    self.advance(Duration::ZERO);
  }

  fn run_deferred(&mut self, task: Deferred) {
    match task {
      Deferred::Highlight(edge) => {
        if !self.state.opened() || self.state.suggestions.is_empty() {
          return;
        }
        match edge {
          Edge::First => self.list.highlight_next(),
          Edge::Last => self.list.highlight_previous(),
        }
      },
      Deferred::Refocus => {
        if self.config.disabled || self.refocus_suppressed.is_engaged() {
          return;
        }
        if let Some(target) = self.binding.current() {
          target.borrow_mut().focus();
        }
      },
      Deferred::ReleaseRefocusSuppression(generation) => {
        if self.refocus_suppressed.release(generation) {
          log::debug!("refocus suppression released");
        }
      },
      Deferred::ReleaseFocusIgnore(generation) => {
        self.focus_ignored.release(generation);
      },
    }
  }

  fn resolve_target(&mut self) -> Option<TargetRef> {
    let container = self.container.clone()?;
    let change = self.binding.resolve(container.as_ref());
    if let Some(released) = &change.released {
      released.borrow_mut().set_accessibility(None);
      self.reset_query_state(Reason::Detached);
    }
    if change.attached.is_some() {
      self.sync_accessibility();
    }
    self.binding.current()
  }

  fn run_query(&mut self, value: String) {
    let reuse = self
      .state
      .previous_query
      .as_deref()
      .is_some_and(|previous| !previous.is_empty() && value.starts_with(previous));
    self.query = value.clone();

    if !reuse {
      log::debug!("requesting suggestions for {value:?}");
      self.state.previous_query = Some(value.clone());
      self.awaiting_source = true;
      self
        .notifications
        .push(Notification::QueryRequest { value });
      if self.config.loader && !self.state.opened() {
        self.set_loading(true);
        self.open(Reason::Loading);
      }
    }

    self.render();
  }

  fn render(&mut self) {
    let was_open = self.state.opened();
    let suggestions = self
      .normalized
      .as_deref()
      .map(|normalized| filter_and_rank(normalized, &self.query, self.config.open_on_focus))
      .unwrap_or_default();

    if suggestions != self.state.suggestions || !was_open {
      self.list.set_items(&suggestions);
    }
    if suggestions != self.state.suggestions {
      self.state.suggestions = suggestions;
      self.request_resize();
    }

    if !self.state.suggestions.is_empty() {
      self.open(Reason::Results);
    } else if self.state.loading {
      self.open(Reason::Loading);
    } else {
      self.close(Reason::Empty);
    }

    if was_open && self.state.opened() {
      self.positioning.refit();
    }
  }

  fn flush_pending_highlight(&mut self) {
    if !self.state.opened() || self.state.loading || self.state.suggestions.is_empty() {
      return;
    }
    if let Some(edge) = self.pending_highlight.take() {
      self
        .scheduler
        .schedule(Duration::ZERO, Deferred::Highlight(edge));
    }
  }

  fn request_resize(&mut self) {
    self.positioning.notify_resize();
    self.notifications.push(Notification::ResizeRequest);
  }

  fn set_loading(&mut self, loading: bool) {
    if self.state.loading == loading {
      return;
    }
    self.state.loading = loading;
    self.notifications.push(Notification::LoadingChanged);
  }

  fn open(&mut self, reason: Reason) {
    let transition = self.state.visibility.open(reason);
    self.apply_transition(transition);
  }

  /// Close on the user's behalf, dropping any outstanding request and
  /// loading state with the panel.
  fn dismiss(&mut self, reason: Reason) {
    if !self.state.opened() {
      return;
    }
    self.close(reason);
    self.awaiting_source = false;
    self.set_loading(false);
  }

  fn close(&mut self, reason: Reason) {
    let transition = self.state.visibility.close(reason);
    self.apply_transition(transition);
  }

  fn apply_transition(&mut self, transition: Option<Transition>) {
    let Some(transition) = transition else {
      return;
    };
    match transition.to {
      Visibility::Open => {
        self
          .positioning
          .open(self.binding.current(), self.config.alignment);
      },
      Visibility::Closed => {
        self.pending_highlight = None;
        self.positioning.close();
      },
    }
    self.sync_accessibility();
    self.notifications.push(Notification::VisibilityChanged);
  }

  fn reset_query_state(&mut self, reason: Reason) {
    self.state.previous_query = None;
    self.query.clear();
    self.awaiting_source = false;
    self.pending_highlight = None;
    self.echo = None;
    self.refocus_suppressed.reset();
    self.focus_ignored.reset();
    self.set_loading(false);
    self.close(reason);
    if !self.state.suggestions.is_empty() {
      self.state.suggestions.clear();
      self.list.set_items(&[]);
      self.request_resize();
    }
  }

  fn sync_accessibility(&mut self) {
    let Some(target) = self.binding.current() else {
      return;
    };
    if self.config.no_target_controls {
      target.borrow_mut().set_accessibility(None);
      return;
    }
    let accessibility = Accessibility {
      controls:     self.config.panel_id.clone(),
      expanded:     self.state.opened(),
      autocomplete: ARIA_AUTOCOMPLETE,
    };
    target
      .borrow_mut()
      .set_accessibility(Some(&accessibility));
  }
}

impl<P, L> Drop for Autocomplete<P, L> {
  fn drop(&mut self) {
    if let Some(container) = self.container.take() {
      container.unlisten_outside_pointer();
    }
    if let Some(released) = self.binding.detach() {
      released.borrow_mut().set_accessibility(None);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::headless::{
    ElementRegistry,
    MenuList,
    RecordingPositioner,
    TextInput,
  };

  #[test]
  fn unattached_engine_is_inert() {
    let mut engine = Autocomplete::new(
      AutocompleteConfig::default(),
      RecordingPositioner::default(),
      MenuList::default(),
    );
    let input = TextInput::shared("ap");
    let target: TargetRef = input.clone();
    engine.set_target(Some(TargetSpec::element(&target)));
    engine.set_source(Some(Rc::from(vec![SourceItem::from("apple")])));

    engine.on_input();
    assert_eq!(engine.on_key(KeyEvent::plain(Key::Down)), KeyOutcome::Continue);
    assert!(!engine.opened());
    assert!(engine.drain_notifications().is_empty());
    assert!(input.borrow().listeners().is_empty());
  }

  #[test]
  fn drop_releases_listeners() {
    let registry = Rc::new(ElementRegistry::default());
    let input = TextInput::shared("");
    let target: TargetRef = input.clone();
    {
      let mut engine = Autocomplete::new(
        AutocompleteConfig::default(),
        RecordingPositioner::default(),
        MenuList::default(),
      );
      engine.attach(registry.clone());
      engine.set_target(Some(TargetSpec::element(&target)));
      assert!(!input.borrow().listeners().is_empty());
      assert!(registry.is_listening_outside());
    }
    assert!(input.borrow().listeners().is_empty());
    assert!(input.borrow().accessibility().is_none());
    assert!(!registry.is_listening_outside());
  }
}
