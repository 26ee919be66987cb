//! The bound input and how the engine attaches to it.
//!
//! Targets are owned by the embedding application. The engine only keeps a
//! [`Weak`] handle, so dropping a target on the application side simply
//! makes the engine inert until another target is bound.

use std::{
  cell::RefCell,
  rc::{
    Rc,
    Weak,
  },
};

bitflags::bitflags! {
  /// Target signals the engine subscribes to.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct Listeners: u8 {
    const INPUT = 1 << 0;
    const FOCUS = 1 << 1;
    const KEYDOWN = 1 << 2;
  }
}

/// Raw value of a target before string coercion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TargetValue {
  #[default]
  Empty,
  Text(String),
  Number(f64),
}

impl TargetValue {
  /// String form of the value, numbers printed the way a script runtime
  /// would (`3.0` is `"3"`).
  pub fn coerce(&self) -> String {
    match self {
      Self::Empty => String::new(),
      Self::Text(text) => text.clone(),
      Self::Number(number) => format_number(*number),
    }
  }
}

impl From<&str> for TargetValue {
  fn from(text: &str) -> Self {
    Self::Text(text.to_string())
  }
}

impl From<String> for TargetValue {
  fn from(text: String) -> Self {
    Self::Text(text)
  }
}

impl From<f64> for TargetValue {
  fn from(number: f64) -> Self {
    Self::Number(number)
  }
}

fn format_number(number: f64) -> String {
  if number.is_nan() {
    return "NaN".to_string();
  }
  if number.is_infinite() {
    return if number.is_sign_positive() {
      "Infinity".to_string()
    } else {
      "-Infinity".to_string()
    };
  }
  if number == 0.0 {
    return "0".to_string();
  }
  if number.fract() == 0.0 && number.abs() < 1e21 {
    return format!("{number:.0}");
  }
  format!("{number}")
}

pub const ARIA_AUTOCOMPLETE: &str = "list";

/// Accessibility state wired onto the target while it is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessibility {
  /// Id of the panel the target controls.
  pub controls:     String,
  pub expanded:     bool,
  pub autocomplete: &'static str,
}

/// An input-like object the engine observes and writes back to.
pub trait Target {
  fn value(&self) -> TargetValue;
  fn set_value(&mut self, value: &str);
  /// Raise the input-changed signal for the target's other observers.
  fn notify_input(&mut self);
  fn focus(&mut self);
  fn listen(&mut self, listeners: Listeners);
  fn unlisten(&mut self, listeners: Listeners);
  /// `None` removes any wiring previously applied.
  fn set_accessibility(&mut self, _accessibility: Option<&Accessibility>) {}
}

pub type TargetRef = Rc<RefCell<dyn Target>>;
pub type WeakTarget = Weak<RefCell<dyn Target>>;

/// Which target to bind: a direct handle, or an id resolved through the
/// owning container.
#[derive(Debug, Clone)]
pub enum TargetSpec {
  Element(WeakTarget),
  Id(String),
}

impl TargetSpec {
  pub fn element(target: &TargetRef) -> Self {
    Self::Element(Rc::downgrade(target))
  }

  pub fn id(id: impl Into<String>) -> Self {
    Self::Id(id.into())
  }
}

/// Where a pointer press landed, as judged by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOrigin {
  Target,
  Panel,
  Outside,
}

/// The document-like owner the engine is attached to.
pub trait Container {
  fn lookup_target(&self, id: &str) -> Option<TargetRef>;
  /// Start delivering pointer presses anywhere in the container.
  fn listen_outside_pointer(&self);
  fn unlisten_outside_pointer(&self);
}

/// Result of a resolution pass.
#[derive(Default)]
pub struct BindingChange {
  pub released: Option<TargetRef>,
  pub attached: Option<TargetRef>,
}

impl BindingChange {
  pub fn is_changed(&self) -> bool {
    self.released.is_some() || self.attached.is_some()
  }
}

/// Keeps listeners attached to exactly one target at a time.
#[derive(Debug, Default)]
pub struct TargetBinding {
  spec:  Option<TargetSpec>,
  bound: Option<WeakTarget>,
  stale: bool,
}

impl TargetBinding {
  pub fn spec(&self) -> Option<&TargetSpec> {
    self.spec.as_ref()
  }

  pub fn set_spec(&mut self, spec: Option<TargetSpec>) {
    self.spec = spec;
    self.stale = true;
  }

  pub fn current(&self) -> Option<TargetRef> {
    self.bound.as_ref().and_then(Weak::upgrade)
  }

  pub fn is_bound(&self) -> bool {
    self.current().is_some()
  }

  /// Bring the bound target in line with the requested [`TargetSpec`].
  ///
  /// Id specs are looked up through `container` until a lookup succeeds;
  /// failed lookups are retried on the next call.
  pub fn resolve(&mut self, container: &dyn Container) -> BindingChange {
    let current = self.current();
    if current.is_none() {
      self.bound = None;
    }

    let desired = match &self.spec {
      None => None,
      Some(TargetSpec::Element(weak)) => weak.upgrade(),
      Some(TargetSpec::Id(id)) => {
        match &current {
          Some(current) if !self.stale => Some(current.clone()),
          _ => {
            let found = container.lookup_target(id);
            if found.is_none() {
              log::trace!("target '{id}' not resolvable yet");
            }
            found
          },
        }
      },
    };
    if desired.is_some() || !matches!(self.spec, Some(TargetSpec::Id(_))) {
      self.stale = false;
    }

    match (&current, &desired) {
      (Some(current), Some(desired)) if Rc::ptr_eq(current, desired) => BindingChange::default(),
      (None, None) => BindingChange::default(),
      _ => {
        let released = self.detach();
        if let Some(target) = &desired {
          target.borrow_mut().listen(Listeners::all());
          self.bound = Some(Rc::downgrade(target));
        }
        BindingChange {
          released,
          attached: desired,
        }
      },
    }
  }

  /// Remove all listeners and forget the bound target. The request is kept so
  /// a later [`TargetBinding::resolve`] can bind again.
  pub fn detach(&mut self) -> Option<TargetRef> {
    let released = self.current();
    if let Some(target) = &released {
      target.borrow_mut().unlisten(Listeners::all());
    }
    self.bound = None;
    self.stale = true;
    released
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::headless::{
    ElementRegistry,
    TextInput,
  };

  #[test]
  fn numbers_coerce_like_script_strings() {
    assert_eq!(TargetValue::Number(42.0).coerce(), "42");
    assert_eq!(TargetValue::Number(-3.0).coerce(), "-3");
    assert_eq!(TargetValue::Number(1.5).coerce(), "1.5");
    assert_eq!(TargetValue::Number(-0.0).coerce(), "0");
    assert_eq!(TargetValue::Number(f64::NAN).coerce(), "NaN");
    assert_eq!(TargetValue::Empty.coerce(), "");
    assert_eq!(TargetValue::from("ap").coerce(), "ap");
  }

  #[test]
  fn binds_direct_reference_and_listens() {
    let registry = ElementRegistry::default();
    let input = TextInput::shared("");
    let target: TargetRef = input.clone();
    let mut binding = TargetBinding::default();
    binding.set_spec(Some(TargetSpec::element(&target)));

    let change = binding.resolve(&registry);
    assert!(change.attached.is_some());
    assert!(change.released.is_none());
    assert_eq!(input.borrow().listeners(), Listeners::all());

    let change = binding.resolve(&registry);
    assert!(!change.is_changed());
  }

  #[test]
  fn rebinding_the_same_reference_is_a_no_op() {
    let registry = ElementRegistry::default();
    let input = TextInput::shared("");
    let target: TargetRef = input.clone();
    let mut binding = TargetBinding::default();
    binding.set_spec(Some(TargetSpec::element(&target)));
    binding.resolve(&registry);

    binding.set_spec(Some(TargetSpec::element(&target)));
    let change = binding.resolve(&registry);
    assert!(!change.is_changed());
    assert_eq!(input.borrow().listeners(), Listeners::all());
  }

  #[test]
  fn rebinding_moves_listeners() {
    let registry = ElementRegistry::default();
    let first = TextInput::shared("");
    let second = TextInput::shared("");
    let first_ref: TargetRef = first.clone();
    let second_ref: TargetRef = second.clone();

    let mut binding = TargetBinding::default();
    binding.set_spec(Some(TargetSpec::element(&first_ref)));
    binding.resolve(&registry);
    binding.set_spec(Some(TargetSpec::element(&second_ref)));
    let change = binding.resolve(&registry);

    assert!(change.released.is_some());
    assert!(change.attached.is_some());
    assert_eq!(first.borrow().listeners(), Listeners::empty());
    assert_eq!(second.borrow().listeners(), Listeners::all());
  }

  #[test]
  fn id_lookup_is_retried_until_it_succeeds() {
    let registry = ElementRegistry::default();
    let mut binding = TargetBinding::default();
    binding.set_spec(Some(TargetSpec::id("city")));

    assert!(!binding.resolve(&registry).is_changed());
    assert!(!binding.is_bound());

    let input = TextInput::shared("");
    registry.insert("city", input.clone());
    let change = binding.resolve(&registry);
    assert!(change.attached.is_some());
    assert_eq!(input.borrow().listeners(), Listeners::all());
  }

  #[test]
  fn dropped_target_leaves_binding_inert() {
    let registry = ElementRegistry::default();
    let mut binding = TargetBinding::default();
    {
      let target: TargetRef = TextInput::shared("");
      binding.set_spec(Some(TargetSpec::element(&target)));
      binding.resolve(&registry);
      assert!(binding.is_bound());
    }
    assert!(!binding.is_bound());
    assert!(!binding.resolve(&registry).is_changed());
  }

  #[test]
  fn detach_removes_listeners() {
    let registry = ElementRegistry::default();
    let input = TextInput::shared("");
    let target: TargetRef = input.clone();
    let mut binding = TargetBinding::default();
    binding.set_spec(Some(TargetSpec::element(&target)));
    binding.resolve(&registry);

    assert!(binding.detach().is_some());
    assert_eq!(input.borrow().listeners(), Listeners::empty());
    assert!(!binding.is_bound());
  }
}
