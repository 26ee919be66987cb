//! Scripted sessions.
//!
//! ```toml
//! auto-respond = true
//!
//! [[step]]
//! action = "type"
//! text = "ap"
//!
//! [[step]]
//! action = "key"
//! key = "ArrowDown"
//!
//! [[step]]
//! action = "wait"
//! ms = 250
//! ```

use std::{
  cell::RefCell,
  io::Write,
  path::Path,
  rc::Rc,
  time::Duration,
};

use eyre::{
  Result,
  WrapErr,
};
use serde::{
  Deserialize,
  Serialize,
};
use the_suggest::{
  Autocomplete,
  AutocompleteConfig,
  ElementRegistry,
  Key,
  KeyEvent,
  MenuList,
  Notification,
  NotificationEvent,
  PointerOrigin,
  RecordingPositioner,
  SourceItem,
  SuggestionList,
  TargetRef,
  TargetSpec,
  TextInput,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Script {
  /// Answer every query request by handing the current source back.
  pub auto_respond: bool,
  #[serde(rename = "step")]
  pub steps:        Vec<Step>,
}

impl Default for Script {
  fn default() -> Self {
    Self {
      auto_respond: true,
      steps:        Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
  Target,
  Panel,
  Outside,
}

impl From<Origin> for PointerOrigin {
  fn from(origin: Origin) -> Self {
    match origin {
      Origin::Target => Self::Target,
      Origin::Panel => Self::Panel,
      Origin::Outside => Self::Outside,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
  Focus,
  /// Replace the target value, as typing would.
  Type { text: String },
  /// DOM key name, optionally chorded (`ArrowDown`, `Ctrl+Enter`, ...).
  Key { key: String },
  Pointer { origin: Origin },
  Wait { ms: u64 },
  /// Replace the current source.
  Source { items: Vec<SourceItem> },
  /// Pick a row directly, as a pointer press on the list would.
  Select { index: usize },
  Disable,
  Enable,
  Render,
}

impl Script {
  pub fn from_toml(text: &str) -> Result<Self> {
    Ok(toml::from_str(text)?)
  }

  pub fn load(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path)
      .wrap_err_with(|| format!("failed to read script {}", path.display()))?;
    Self::from_toml(&text).wrap_err_with(|| format!("invalid script {}", path.display()))
  }
}

#[derive(Serialize)]
struct Line<'a> {
  at_ms: u128,
  #[serde(flatten)]
  event: &'a NotificationEvent,
}

#[derive(Serialize)]
struct Summary<'a> {
  kind:        &'static str,
  at_ms:       u128,
  opened:      bool,
  loading:     bool,
  query:       &'a str,
  value:       String,
  suggestions: Vec<&'a str>,
  highlighted: Option<usize>,
}

type Engine = Autocomplete<RecordingPositioner, MenuList>;

/// Host loop for a scripted session. Routes target signals raised by the
/// engine back into it, the way a toolkit would.
struct Session<'w, W: Write> {
  engine:       Engine,
  input:        Rc<RefCell<TextInput>>,
  source:       Option<Rc<[SourceItem]>>,
  auto_respond: bool,
  seen_signals: usize,
  seen_focus:   usize,
  out:          &'w mut W,
}

impl<W: Write> Session<'_, W> {
  fn apply(&mut self, step: &Step) {
    log::info!("step {step:?}");
    match step {
      Step::Focus => self.engine.on_focus(),
      Step::Type { text } => {
        self.input.borrow_mut().set_raw_value(text.as_str());
        self.engine.on_input();
      },
      Step::Key { key } => {
        let event = key
          .parse::<KeyEvent>()
          .unwrap_or(KeyEvent::plain(Key::Other));
        let outcome = self.engine.on_key(event);
        log::info!("{event:?} -> {outcome:?}");
      },
      Step::Pointer { origin } => self.engine.on_pointer_down((*origin).into()),
      Step::Wait { ms } => self.engine.advance(Duration::from_millis(*ms)),
      Step::Source { items } => {
        self.source = Some(Rc::from(items.clone()));
        self.engine.set_source(self.source.clone());
      },
      Step::Select { index } => {
        self.engine.list_mut().select(*index);
        self.engine.on_list_selection();
      },
      Step::Disable => self.engine.set_disabled(true),
      Step::Enable => self.engine.set_disabled(false),
      Step::Render => self.engine.request_render(),
    }
  }

  fn route_signals(&mut self) {
    self.engine.run_pending();
    let (signals, focus) = {
      let input = self.input.borrow();
      (input.input_signals(), input.focus_count())
    };
    if signals != self.seen_signals {
      self.seen_signals = signals;
      self.engine.on_input();
    }
    if focus != self.seen_focus {
      self.seen_focus = focus;
      self.engine.on_focus();
    }
  }

  fn flush(&mut self) -> Result<()> {
    loop {
      let events = self.engine.drain_notifications();
      if events.is_empty() {
        return Ok(());
      }
      let at_ms = self.engine.now().as_millis();
      let mut requested = false;
      for event in &events {
        requested |= matches!(event.notification, Notification::QueryRequest { .. });
        serde_json::to_writer(&mut *self.out, &Line { at_ms, event })?;
        writeln!(self.out)?;
      }
      if requested && self.auto_respond {
        self.engine.set_source(self.source.clone());
        self.engine.run_pending();
      }
    }
  }

  fn summarize(&mut self) -> Result<()> {
    let summary = Summary {
      kind:        "summary",
      at_ms:       self.engine.now().as_millis(),
      opened:      self.engine.opened(),
      loading:     self.engine.loading(),
      query:       self.engine.query(),
      value:       self.input.borrow().value_text(),
      suggestions: self
        .engine
        .suggestions()
        .iter()
        .map(|item| item.value.as_str())
        .collect(),
      highlighted: self.engine.list().highlighted(),
    };
    serde_json::to_writer(&mut *self.out, &summary)?;
    writeln!(self.out)?;
    Ok(())
  }
}

/// Run `script` and write one JSON line per notification, followed by a
/// summary of the final state.
pub fn replay(
  config: AutocompleteConfig,
  source: Option<Rc<[SourceItem]>>,
  script: &Script,
  out: &mut impl Write,
) -> Result<()> {
  let registry = Rc::new(ElementRegistry::default());
  let input = TextInput::shared("");
  let target: TargetRef = input.clone();

  let mut engine = Autocomplete::new(config, RecordingPositioner::default(), MenuList::default());
  engine.attach(registry);
  engine.set_target(Some(TargetSpec::element(&target)));
  engine.set_source(source.clone());

  let mut session = Session {
    engine,
    input,
    source,
    auto_respond: script.auto_respond,
    seen_signals: 0,
    seen_focus: 0,
    out,
  };
  for step in &script.steps {
    session.apply(step);
    session.route_signals();
    session.flush()?;
  }
  session.summarize()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(config: AutocompleteConfig, source: &[&str], script: &str) -> Vec<serde_json::Value> {
    let script = Script::from_toml(script).unwrap();
    let source: Rc<[SourceItem]> = source.iter().copied().map(SourceItem::from).collect();
    let mut out = Vec::new();
    replay(config, Some(source), &script, &mut out).unwrap();
    String::from_utf8(out)
      .unwrap()
      .lines()
      .map(|line| serde_json::from_str(line).unwrap())
      .collect()
  }

  fn kinds(lines: &[serde_json::Value]) -> Vec<&str> {
    lines
      .iter()
      .map(|line| line["kind"].as_str().unwrap())
      .collect()
  }

  #[test]
  fn parses_tagged_steps() {
    let script = Script::from_toml(
      r#"
        auto-respond = false

        [[step]]
        action = "type"
        text = "ap"

        [[step]]
        action = "pointer"
        origin = "outside"

        [[step]]
        action = "source"
        items = ["apple", { value = "pear", label = "Pear" }]

        [[step]]
        action = "disable"
      "#,
    )
    .unwrap();
    assert!(!script.auto_respond);
    assert_eq!(script.steps.len(), 4);
    assert_eq!(script.steps[0], Step::Type {
      text: "ap".to_string(),
    });
    assert_eq!(script.steps[1], Step::Pointer {
      origin: Origin::Outside,
    });
    let Step::Source { items } = &script.steps[2] else {
      panic!("expected a source step");
    };
    assert_eq!(items[1].value(), Some("pear"));
    assert_eq!(script.steps[3], Step::Disable);
  }

  #[test]
  fn empty_script_defaults_to_auto_respond() {
    let script = Script::from_toml("").unwrap();
    assert!(script.auto_respond);
    assert!(script.steps.is_empty());
  }

  #[test]
  fn unknown_action_is_rejected() {
    assert!(Script::from_toml("[[step]]\naction = \"hover\"").is_err());
  }

  #[test]
  fn replay_selects_with_the_keyboard() {
    let lines = run(
      AutocompleteConfig::default(),
      &["apple", "apricot", "banana"],
      r#"
        [[step]]
        action = "type"
        text = "apr"

        [[step]]
        action = "key"
        key = "ArrowDown"

        [[step]]
        action = "key"
        key = "Enter"
      "#,
    );
    assert_eq!(kinds(&lines), vec![
      "query-request",
      "resize-request",
      "visibility-changed",
      "visibility-changed",
      "selected",
      "summary",
    ]);
    assert_eq!(lines[0]["value"], "apr");
    assert_eq!(lines[4]["item"], "apricot");

    let summary = &lines[5];
    assert_eq!(summary["value"], "apricot");
    assert_eq!(summary["opened"], false);
  }

  #[test]
  fn replay_without_auto_respond_waits_for_a_source_step() {
    let lines = run(
      AutocompleteConfig::default(),
      &["apple"],
      r#"
        auto-respond = false

        [[step]]
        action = "type"
        text = "ki"

        [[step]]
        action = "source"
        items = ["kiwi", "apple"]
      "#,
    );
    assert_eq!(kinds(&lines), vec![
      "query-request",
      "resize-request",
      "visibility-changed",
      "summary",
    ]);
    assert_eq!(lines[3]["suggestions"], serde_json::json!(["kiwi"]));
    assert_eq!(lines[3]["opened"], true);
  }

  #[test]
  fn replay_leaves_chorded_enter_to_the_host() {
    let lines = run(
      AutocompleteConfig::default(),
      &["apple", "apricot"],
      r#"
        [[step]]
        action = "type"
        text = "apr"

        [[step]]
        action = "key"
        key = "Ctrl+Enter"
      "#,
    );
    assert_eq!(kinds(&lines), vec![
      "query-request",
      "resize-request",
      "visibility-changed",
      "summary",
    ]);
    assert_eq!(lines[3]["opened"], true);
    assert_eq!(lines[3]["value"], "apr");
  }
}
