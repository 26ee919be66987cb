//! Candidate sources and their index-tagged normalized form.
//!
//! A source is owned by the embedding application and handed to the engine
//! as a shared slice. The engine only ever reads it: [`normalize`] copies
//! every usable entry into an [`InternalSuggestion`] that remembers where it
//! came from, so a committed suggestion can always be traced back to the
//! exact item the application supplied.

use std::fmt;

use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  de::{
    MapAccess,
    Visitor,
    value::MapAccessDeserializer,
  },
};
use serde_json::Value;

/// Opaque, application-defined correlation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionId {
  Number(i64),
  Text(String),
}

/// A structured candidate entry.
///
/// `label` and `description` are display-only and never read by the engine,
/// so they hold whatever the application put there. `filter` replaces
/// `value` as the text the query is matched against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Suggestion {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label:       Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub filter:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:          Option<SuggestionId>,
}

#[derive(Deserialize)]
struct SuggestionFields {
  #[serde(default)]
  value:       Option<String>,
  #[serde(default)]
  label:       Option<Value>,
  #[serde(default)]
  description: Option<Value>,
  #[serde(default)]
  filter:      Option<String>,
  #[serde(default)]
  id:          Option<SuggestionId>,
}

struct SuggestionVisitor;

impl<'de> Visitor<'de> for SuggestionVisitor {
  type Value = Suggestion;

  fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    formatter.write_str("a suggestion object")
  }

  fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Suggestion, A::Error> {
    let fields = SuggestionFields::deserialize(MapAccessDeserializer::new(map))?;
    Ok(Suggestion {
      value:       fields.value,
      label:       fields.label,
      description: fields.description,
      filter:      fields.filter,
      id:          fields.id,
    })
  }
}

/// Only objects are suggestions. Sequences would otherwise fill the fields
/// positionally and turn `["apple"]` into a valid entry.
impl<'de> Deserialize<'de> for Suggestion {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_map(SuggestionVisitor)
  }
}

impl Suggestion {
  pub fn new(value: impl Into<String>) -> Self {
    Self {
      value: Some(value.into()),
      ..Self::default()
    }
  }

  pub fn with_label(mut self, label: impl Into<Value>) -> Self {
    self.label = Some(label.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<Value>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
    self.filter = Some(filter.into());
    self
  }

  pub fn with_id(mut self, id: SuggestionId) -> Self {
    self.id = Some(id);
    self
  }
}

/// One entry of a source, exactly as the application supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceItem {
  Text(String),
  Suggestion(Suggestion),
  /// Anything that is neither a string nor an object. Kept so that index
  /// positions of deserialized sources line up; never suggested.
  Malformed(Value),
}

impl SourceItem {
  /// The usable value of this entry, if it has one.
  pub fn value(&self) -> Option<&str> {
    match self {
      Self::Text(text) => Some(text),
      Self::Suggestion(suggestion) => {
        suggestion
          .value
          .as_deref()
          .filter(|value| !value.is_empty())
      },
      Self::Malformed(_) => None,
    }
  }
}

impl From<&str> for SourceItem {
  fn from(text: &str) -> Self {
    Self::Text(text.to_string())
  }
}

impl From<String> for SourceItem {
  fn from(text: String) -> Self {
    Self::Text(text)
  }
}

impl From<Suggestion> for SourceItem {
  fn from(suggestion: Suggestion) -> Self {
    Self::Suggestion(suggestion)
  }
}

/// A normalized suggestion tagged with its position in the original source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalSuggestion {
  pub value:       String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label:       Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub filter:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:          Option<SuggestionId>,
  pub index:       usize,
}

impl InternalSuggestion {
  fn from_source(index: usize, item: &SourceItem) -> Option<Self> {
    match item {
      SourceItem::Text(text) => {
        Some(Self {
          value: text.clone(),
          label: None,
          description: None,
          filter: None,
          id: None,
          index,
        })
      },
      SourceItem::Suggestion(suggestion) => {
        let value = item.value()?;
        Some(Self {
          value: value.to_string(),
          label: suggestion.label.clone(),
          description: suggestion.description.clone(),
          filter: suggestion.filter.clone(),
          id: suggestion.id.clone(),
          index,
        })
      },
      SourceItem::Malformed(_) => None,
    }
  }

  /// Text the query is matched against.
  pub fn match_text(&self) -> &str {
    self.filter.as_deref().unwrap_or(&self.value)
  }
}

/// Convert a source into its index-tagged form.
///
/// Returns `None` when no source is configured, which callers must keep
/// apart from an empty source. Entries without a usable value are skipped;
/// the remaining entries keep their original positions as `index` and stay
/// in source order.
pub fn normalize(source: Option<&[SourceItem]>) -> Option<Vec<InternalSuggestion>> {
  let source = source?;
  Some(
    source
      .iter()
      .enumerate()
      .filter_map(|(index, item)| InternalSuggestion::from_source(index, item))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn build_source(entries: &[Option<String>]) -> Vec<SourceItem> {
    entries
      .iter()
      .map(|entry| {
        match entry {
          Some(text) if text.len() % 2 == 0 => SourceItem::Text(text.clone()),
          Some(text) => SourceItem::Suggestion(Suggestion::new(text.clone())),
          None => SourceItem::Suggestion(Suggestion::default()),
        }
      })
      .collect()
  }

  quickcheck::quickcheck! {
      fn indices_point_at_original_positions(entries: Vec<Option<String>>) -> bool {
          let source = build_source(&entries);
          let normalized = normalize(Some(&source)).unwrap_or_default();
          normalized.iter().all(|item| source[item.index].value() == Some(item.value.as_str()))
      }

      fn indices_are_strictly_increasing(entries: Vec<Option<String>>) -> bool {
          let source = build_source(&entries);
          let normalized = normalize(Some(&source)).unwrap_or_default();
          normalized.windows(2).all(|pair| pair[0].index < pair[1].index)
      }
  }

  #[test]
  fn missing_source_is_not_empty_source() {
    assert_eq!(normalize(None), None);
    assert_eq!(normalize(Some(&[])), Some(Vec::new()));
  }

  #[test]
  fn strings_become_values() {
    let source = vec![SourceItem::from("apple"), SourceItem::from("pear")];
    let normalized = normalize(Some(&source)).unwrap();
    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized[0].value, "apple");
    assert_eq!(normalized[0].index, 0);
    assert_eq!(normalized[1].value, "pear");
    assert_eq!(normalized[1].index, 1);
  }

  #[test]
  fn dropped_entries_keep_later_indices() {
    let source = vec![
      SourceItem::from(Suggestion::default().with_label("no value")),
      SourceItem::Malformed(serde_json::json!(42)),
      SourceItem::from(Suggestion::new("")),
      SourceItem::from(Suggestion::new("kiwi").with_label("Kiwi")),
    ];
    let normalized = normalize(Some(&source)).unwrap();
    assert_eq!(normalized.len(), 1);
    assert_eq!(normalized[0].value, "kiwi");
    assert_eq!(normalized[0].label, Some(Value::from("Kiwi")));
    assert_eq!(normalized[0].index, 3);
  }

  #[test]
  fn structured_metadata_is_copied() {
    let item = Suggestion::new("rs")
      .with_label("Rust")
      .with_description("systems language")
      .with_filter("rust")
      .with_id(SuggestionId::Number(7));
    let source = vec![SourceItem::from(item.clone())];
    let normalized = normalize(Some(&source)).unwrap();
    assert_eq!(normalized[0].match_text(), "rust");
    assert_eq!(normalized[0].id, Some(SuggestionId::Number(7)));
    assert_eq!(source[0], SourceItem::Suggestion(item));
  }

  #[test]
  fn deserializes_mixed_json_sources() {
    let source: Vec<SourceItem> = serde_json::from_str(
      r#"["apple", {"value": "banana", "label": "Banana", "id": "b"}, 3, null, {"label": "x"}]"#,
    )
    .unwrap();
    assert_eq!(source[0], SourceItem::from("apple"));
    assert!(matches!(source[1], SourceItem::Suggestion(_)));
    assert!(matches!(source[2], SourceItem::Malformed(_)));
    assert!(matches!(source[3], SourceItem::Malformed(_)));

    let normalized = normalize(Some(&source)).unwrap();
    let indices: Vec<_> = normalized.iter().map(|item| item.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(normalized[1].id, Some(SuggestionId::Text("b".into())));
  }

  #[test]
  fn sequences_are_not_suggestions() {
    let source: Vec<SourceItem> = serde_json::from_str(r#"[["apple"], "kiwi"]"#).unwrap();
    assert!(matches!(source[0], SourceItem::Malformed(_)));

    let normalized = normalize(Some(&source)).unwrap();
    assert_eq!(normalized.len(), 1);
    assert_eq!(normalized[0].value, "kiwi");
    assert_eq!(normalized[0].index, 1);
    assert_eq!(
      serde_json::to_value(&source[0]).unwrap(),
      serde_json::json!(["apple"])
    );
  }

  #[test]
  fn structured_display_fields_are_kept_opaque() {
    let source: Vec<SourceItem> = serde_json::from_str(
      r#"[{"value": "apple", "label": {"text": "Apple", "icon": "a.svg"}, "description": ["red", "green"]}]"#,
    )
    .unwrap();
    assert!(matches!(source[0], SourceItem::Suggestion(_)));

    let normalized = normalize(Some(&source)).unwrap();
    assert_eq!(normalized.len(), 1);
    assert_eq!(
      normalized[0].label,
      Some(serde_json::json!({ "text": "Apple", "icon": "a.svg" }))
    );
    assert_eq!(normalized[0].description, Some(serde_json::json!(["red", "green"])));
    assert_eq!(
      serde_json::to_value(&source[0]).unwrap(),
      serde_json::json!({ "value": "apple", "label": { "text": "Apple", "icon": "a.svg" }, "description": ["red", "green"] })
    );
  }
}
