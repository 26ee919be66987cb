//! Key event types delivered by the bound target.

use std::{
  convert::Infallible,
  str::FromStr,
};

bitflags::bitflags! {
  /// Modifier keys held during a key press.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct Modifiers: u8 {
    const SHIFT = 1 << 0;
    const CTRL = 1 << 1;
    const ALT = 1 << 2;
    const META = 1 << 3;
  }
}

impl Modifiers {
  /// Modifiers that turn a key into a shortcut the host owns.
  pub const CHORD: Self = Self::CTRL.union(Self::ALT).union(Self::META);

  pub fn is_chord(self) -> bool {
    self.intersects(Self::CHORD)
  }

  fn from_key_name(name: &str) -> Self {
    match name.to_ascii_lowercase().as_str() {
      "shift" => Self::SHIFT,
      "ctrl" | "control" => Self::CTRL,
      "alt" | "option" => Self::ALT,
      "meta" | "cmd" | "super" => Self::META,
      _ => Self::empty(),
    }
  }
}

/// Keys the engine reacts to. Everything else is `Char` or `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
  Char(char),
  Enter,
  NumpadEnter,
  Escape,
  Tab,
  Up,
  Down,
  Other,
}

/// Parses DOM-style key names (`"ArrowDown"`, `"Enter"`, `"a"`).
impl FromStr for Key {
  type Err = Infallible;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    let key = match name {
      "Enter" => Self::Enter,
      "NumpadEnter" => Self::NumpadEnter,
      "Escape" | "Esc" => Self::Escape,
      "Tab" => Self::Tab,
      "ArrowUp" | "Up" => Self::Up,
      "ArrowDown" | "Down" => Self::Down,
      _ => {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
          (Some(ch), None) => Self::Char(ch),
          _ => Self::Other,
        }
      },
    };
    Ok(key)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  pub key:       Key,
  pub modifiers: Modifiers,
}

impl KeyEvent {
  pub const fn plain(key: Key) -> Self {
    Self {
      key,
      modifiers: Modifiers::empty(),
    }
  }

  pub const fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
    Self { key, modifiers }
  }
}

impl From<Key> for KeyEvent {
  fn from(key: Key) -> Self {
    Self::plain(key)
  }
}

/// Parses `+`-joined chords such as `"Ctrl+Enter"` or `"Shift+ArrowDown"`.
/// Unknown modifier names are ignored.
impl FromStr for KeyEvent {
  type Err = Infallible;

  fn from_str(chord: &str) -> Result<Self, Self::Err> {
    let (prefix, name) = match chord.strip_suffix("++") {
      Some(prefix) => (prefix, "+"),
      None => {
        match chord.rsplit_once('+') {
          Some((prefix, name)) if !prefix.is_empty() && !name.is_empty() => (prefix, name),
          _ => ("", chord),
        }
      },
    };
    let modifiers = prefix
      .split('+')
      .filter(|part| !part.is_empty())
      .fold(Modifiers::empty(), |held, part| held | Modifiers::from_key_name(part));
    let key = name.parse()?;
    Ok(Self::with_modifiers(key, modifiers))
  }
}

/// What the host should do with a key after the engine saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOutcome {
  /// The engine did not use the key.
  #[default]
  Continue,
  /// Consumed: prevent the platform default and stop propagation.
  Handled,
  /// Acted on, but the platform default must still run (focus traversal on
  /// Tab, dismissal chains on Escape).
  PassThrough,
}

impl KeyOutcome {
  pub const fn prevents_default(self) -> bool {
    matches!(self, Self::Handled)
  }

  pub const fn is_handled(self) -> bool {
    !matches!(self, Self::Continue)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_dom_key_names() {
    assert_eq!("ArrowDown".parse::<Key>().unwrap(), Key::Down);
    assert_eq!("ArrowUp".parse::<Key>().unwrap(), Key::Up);
    assert_eq!("Escape".parse::<Key>().unwrap(), Key::Escape);
    assert_eq!("a".parse::<Key>().unwrap(), Key::Char('a'));
    assert_eq!("F13".parse::<Key>().unwrap(), Key::Other);
    assert_eq!("Backspace".parse::<Key>().unwrap(), Key::Other);
  }

  #[test]
  fn parses_chords() {
    let event: KeyEvent = "Ctrl+Enter".parse().unwrap();
    assert_eq!(event.key, Key::Enter);
    assert_eq!(event.modifiers, Modifiers::CTRL);
    assert!(event.modifiers.is_chord());

    let event: KeyEvent = "shift+ArrowDown".parse().unwrap();
    assert_eq!(event.key, Key::Down);
    assert!(!event.modifiers.is_chord());

    let event: KeyEvent = "Alt++".parse().unwrap();
    assert_eq!(event.key, Key::Char('+'));
    assert_eq!(event.modifiers, Modifiers::ALT);

    assert_eq!("+".parse::<KeyEvent>().unwrap(), KeyEvent::plain(Key::Char('+')));
    assert_eq!("Tab".parse::<KeyEvent>().unwrap(), KeyEvent::plain(Key::Tab));
  }

  #[test]
  fn outcome_flags() {
    assert!(KeyOutcome::Handled.prevents_default());
    assert!(!KeyOutcome::PassThrough.prevents_default());
    assert!(KeyOutcome::PassThrough.is_handled());
    assert!(!KeyOutcome::Continue.is_handled());
  }
}
