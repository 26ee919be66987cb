use std::collections::VecDeque;

use serde::Serialize;

use crate::source::SourceItem;

pub const DEFAULT_EVENT_LIMIT: usize = 512;

/// Consumer-facing notifications raised by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Notification {
  /// The application should refresh the source for this query.
  QueryRequest { value: String },
  /// A suggestion was committed. Carries the original source entry.
  Selected { item: SourceItem },
  /// The panel opened or closed; read the engine's `opened()` for the state.
  VisibilityChanged,
  LoadingChanged,
  /// The displayed list changed and the panel should reflow.
  ResizeRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationEvent {
  pub seq:          u64,
  #[serde(flatten)]
  pub notification: Notification,
}

/// Bounded, sequence-numbered log of notifications awaiting the host.
#[derive(Debug, Clone)]
pub struct NotificationLog {
  events:         VecDeque<NotificationEvent>,
  next_event_seq: u64,
  event_limit:    usize,
}

impl Default for NotificationLog {
  fn default() -> Self {
    Self::with_limit(DEFAULT_EVENT_LIMIT)
  }
}

impl NotificationLog {
  pub fn with_limit(event_limit: usize) -> Self {
    Self {
      events:         VecDeque::new(),
      next_event_seq: 1,
      event_limit:    event_limit.max(1),
    }
  }

  pub fn push(&mut self, notification: Notification) {
    let event = NotificationEvent {
      seq: self.next_event_seq,
      notification,
    };
    self.next_event_seq = self.next_event_seq.saturating_add(1);
    self.events.push_back(event);
    while self.events.len() > self.event_limit {
      self.events.pop_front();
    }
  }

  pub fn latest_seq(&self) -> u64 {
    self.next_event_seq.saturating_sub(1)
  }

  pub fn oldest_seq(&self) -> u64 {
    self
      .events
      .front()
      .map(|event| event.seq)
      .unwrap_or(self.next_event_seq)
  }

  pub fn events_since(&self, seq: u64) -> Vec<NotificationEvent> {
    self
      .events
      .iter()
      .filter(|event| event.seq > seq)
      .cloned()
      .collect()
  }

  /// Take every pending event, oldest first.
  pub fn drain(&mut self) -> Vec<NotificationEvent> {
    self.events.drain(..).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }
}
