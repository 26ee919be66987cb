use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
  #[default]
  Closed,
  Open,
}

/// Why the panel changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
  /// A filter pass produced at least one suggestion.
  Results,
  /// A loader-backed request started with nothing to show yet.
  Loading,
  /// A filter pass produced nothing and nothing is loading.
  Empty,
  Disabled,
  OutsidePointer,
  Escape,
  Tab,
  Commit,
  Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub from:   Visibility,
  pub to:     Visibility,
  pub reason: Reason,
}

/// Open/closed state of the suggestion panel.
///
/// Only real changes produce a [`Transition`]; asking for the current state
/// again is silent, which is what keeps visibility notifications idempotent.
#[derive(Debug, Clone, Default)]
pub struct VisibilityMachine {
  state: Visibility,
}

impl VisibilityMachine {
  pub fn state(&self) -> Visibility {
    self.state
  }

  pub fn is_open(&self) -> bool {
    self.state == Visibility::Open
  }

  pub fn transition(&mut self, to: Visibility, reason: Reason) -> Option<Transition> {
    if self.state == to {
      return None;
    }
    let from = std::mem::replace(&mut self.state, to);
    log::debug!("suggestion panel {from:?} -> {to:?} ({reason:?})");
    Some(Transition { from, to, reason })
  }

  pub fn open(&mut self, reason: Reason) -> Option<Transition> {
    self.transition(Visibility::Open, reason)
  }

  pub fn close(&mut self, reason: Reason) -> Option<Transition> {
    self.transition(Visibility::Closed, reason)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_closed() {
    let machine = VisibilityMachine::default();
    assert_eq!(machine.state(), Visibility::Closed);
    assert!(!machine.is_open());
  }

  #[test]
  fn only_real_changes_transition() {
    let mut machine = VisibilityMachine::default();
    assert_eq!(machine.close(Reason::Empty), None);

    let transition = machine.open(Reason::Results).unwrap();
    assert_eq!(transition.from, Visibility::Closed);
    assert_eq!(transition.to, Visibility::Open);
    assert_eq!(machine.open(Reason::Loading), None);

    let transition = machine.close(Reason::Escape).unwrap();
    assert_eq!(transition.reason, Reason::Escape);
    assert!(!machine.is_open());
  }
}
