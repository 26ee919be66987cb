//! Engine options, loadable from TOML.
//!
//! ```toml
//! open-on-focus = true
//! loader = true
//! refocus-grace-ms = 250
//!
//! [alignment]
//! vertical = "top"
//! ```

use std::{
  path::Path,
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

pub const DEFAULT_REFOCUS_GRACE_MS: u64 = 200;
pub const DEFAULT_FOCUS_IGNORE_MS: u64 = 100;
pub const DEFAULT_PANEL_ID: &str = "suggestions";

/// Upper bound for the suppression windows. Anything longer is almost
/// certainly a unit mix-up (seconds written as milliseconds).
pub const MAX_WINDOW_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: std::io::Error,
  },
  #[error(transparent)]
  Parse(#[from] toml::de::Error),
  #[error("panel id must not be empty")]
  EmptyPanelId,
  #[error("{field} is {value}ms (max: {max}ms)")]
  WindowTooLong {
    field: &'static str,
    value: u64,
    max:   u64,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
  Top,
  #[default]
  Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HorizontalAlign {
  #[default]
  Start,
  End,
}

/// Alignment hints handed to the positioning collaborator when the panel
/// opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Alignment {
  pub vertical:   VerticalAlign,
  pub horizontal: HorizontalAlign,
  /// Keep the panel from covering the target.
  pub no_overlap: bool,
}

impl Default for Alignment {
  fn default() -> Self {
    Self {
      vertical:   VerticalAlign::Bottom,
      horizontal: HorizontalAlign::Start,
      no_overlap: true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AutocompleteConfig {
  /// Show the whole source on focus while the query is empty.
  pub open_on_focus:          bool,
  /// Source refreshes are asynchronous; show a loading state meanwhile.
  pub loader:                 bool,
  /// Do not write the committed value back into the target.
  pub no_target_value_update: bool,
  pub disabled:               bool,
  /// Do not wire accessibility state onto the target.
  pub no_target_controls:     bool,
  pub refocus_grace_ms:       u64,
  pub focus_ignore_ms:        u64,
  pub panel_id:               String,
  pub alignment:              Alignment,
}

impl Default for AutocompleteConfig {
  fn default() -> Self {
    Self {
      open_on_focus:          false,
      loader:                 false,
      no_target_value_update: false,
      disabled:               false,
      no_target_controls:     false,
      refocus_grace_ms:       DEFAULT_REFOCUS_GRACE_MS,
      focus_ignore_ms:        DEFAULT_FOCUS_IGNORE_MS,
      panel_id:               DEFAULT_PANEL_ID.to_string(),
      alignment:              Alignment::default(),
    }
  }
}

impl AutocompleteConfig {
  pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
      ConfigError::Io {
        path: path.display().to_string(),
        source,
      }
    })?;
    Self::from_toml(&text)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.panel_id.trim().is_empty() {
      return Err(ConfigError::EmptyPanelId);
    }
    for (field, value) in [
      ("refocus-grace-ms", self.refocus_grace_ms),
      ("focus-ignore-ms", self.focus_ignore_ms),
    ] {
      if value > MAX_WINDOW_MS {
        return Err(ConfigError::WindowTooLong {
          field,
          value,
          max: MAX_WINDOW_MS,
        });
      }
    }
    Ok(())
  }

  pub fn refocus_grace(&self) -> Duration {
    Duration::from_millis(self.refocus_grace_ms)
  }

  pub fn focus_ignore_window(&self) -> Duration {
    Duration::from_millis(self.focus_ignore_ms)
  }
}
