//! Autocomplete suggestion engine.
//!
//! The engine watches a single input-like [`Target`], asks the application
//! for fresh suggestions as the user types, filters and ranks whatever source
//! it is given, and drives a floating panel through the [`Positioning`] and
//! [`SuggestionList`] collaborators. Everything is single-threaded and
//! host-driven: the host forwards signals in, advances the deferred clock,
//! and drains [`Notification`]s out.
//!
//! ```
//! use std::rc::Rc;
//!
//! use the_suggest::{
//!   Autocomplete,
//!   AutocompleteConfig,
//!   ElementRegistry,
//!   MenuList,
//!   Notification,
//!   RecordingPositioner,
//!   SourceItem,
//!   TargetRef,
//!   TargetSpec,
//!   TextInput,
//! };
//!
//! let registry = Rc::new(ElementRegistry::default());
//! let input = TextInput::shared("ap");
//! let target: TargetRef = input.clone();
//!
//! let mut engine = Autocomplete::new(
//!   AutocompleteConfig::default(),
//!   RecordingPositioner::default(),
//!   MenuList::default(),
//! );
//! engine.attach(registry);
//! engine.set_target(Some(TargetSpec::element(&target)));
//! engine.on_input();
//!
//! let requested = engine
//!   .drain_notifications()
//!   .into_iter()
//!   .any(|event| matches!(event.notification, Notification::QueryRequest { .. }));
//! assert!(requested);
//!
//! engine.set_source(Some(Rc::from(vec![
//!   SourceItem::from("apple"),
//!   SourceItem::from("banana"),
//! ])));
//! assert!(engine.opened());
//! assert_eq!(engine.suggestions()[0].value, "apple");
//! ```

pub mod collab;
pub mod config;
pub mod engine;
pub mod event;
pub mod filter;
pub mod headless;
pub mod input;
pub mod schedule;
pub mod source;
pub mod target;
pub mod visibility;

pub use collab::{
  Positioning,
  SuggestionList,
};
pub use config::{
  Alignment,
  AutocompleteConfig,
  ConfigError,
  HorizontalAlign,
  VerticalAlign,
};
pub use engine::{
  Autocomplete,
  Edge,
  EngineState,
};
pub use event::{
  Notification,
  NotificationEvent,
  NotificationLog,
};
pub use filter::filter_and_rank;
pub use headless::{
  ElementRegistry,
  MenuList,
  PositionCall,
  RecordingPositioner,
  TextInput,
};
pub use input::{
  Key,
  KeyEvent,
  KeyOutcome,
  Modifiers,
};
pub use source::{
  InternalSuggestion,
  SourceItem,
  Suggestion,
  SuggestionId,
  normalize,
};
pub use target::{
  Accessibility,
  Container,
  Listeners,
  PointerOrigin,
  Target,
  TargetRef,
  TargetSpec,
  TargetValue,
};
pub use visibility::{
  Reason,
  Visibility,
};
