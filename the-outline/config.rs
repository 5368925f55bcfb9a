//! Outline configuration, read from TOML.
//!
//! A global file and a workspace-local file are merged key by key, the local
//! file winning:
//!
//! ```toml
//! animated-scroll = false
//! trailing-lines = 6
//! fault-policy = "once-per-session"
//!
//! [colors]
//! selection = "#3a5a9080"
//! ```

use std::{
  fmt,
  fs,
  io::Error as IOError,
  path::Path,
};

use serde::Deserialize;
use toml::{
  Value,
  de::Error as TomlError,
};

use crate::{
  error::{
    OutlineError,
    Result,
  },
  fault::FaultPolicy,
  graphics::Color,
  scheme::ColorScheme,
};

/// Upper bound for `trailing-lines`; every extra line costs a row pair of
/// pixmap memory.
pub const MAX_TRAILING_LINES: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutlineConfig {
  /// Smooth-scroll the host on clicks and when a preview slides back.
  pub animated_scroll:          bool,
  /// Highlight the host line under the pointer.
  pub highlight_current_line:   bool,
  /// Draw full-width bands for error and warning markers.
  pub extend_error_highlights:  bool,
  /// Dim the miniature outside the viewport rectangle.
  pub lighten_outside_viewport: bool,
  /// Blank lines the host shows after the last line of the document.
  pub trailing_lines:           u32,
  pub fault_policy:             FaultPolicy,
  pub colors:                   ColorOverrides,
}

impl Default for OutlineConfig {
  fn default() -> Self {
    Self {
      animated_scroll:          true,
      highlight_current_line:   true,
      extend_error_highlights:  true,
      lighten_outside_viewport: true,
      trailing_lines:           6,
      fault_policy:             FaultPolicy::default(),
      colors:                   ColorOverrides::default(),
    }
  }
}

/// Per-field replacements for the host colour scheme.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ColorOverrides {
  pub background:   Option<Color>,
  pub foreground:   Option<Color>,
  pub caret:        Option<Color>,
  pub caret_row:    Option<Color>,
  pub selection:    Option<Color>,
  pub right_margin: Option<Color>,
  pub error_stripe: Option<Color>,
  pub folded_text:  Option<Color>,
}

impl ColorOverrides {
  pub fn apply(&self, scheme: ColorScheme) -> ColorScheme {
    ColorScheme {
      background:   self.background.unwrap_or(scheme.background),
      foreground:   self.foreground.unwrap_or(scheme.foreground),
      caret:        self.caret.unwrap_or(scheme.caret),
      caret_row:    self.caret_row.unwrap_or(scheme.caret_row),
      selection:    self.selection.unwrap_or(scheme.selection),
      right_margin: self.right_margin.unwrap_or(scheme.right_margin),
      error_stripe: self.error_stripe.unwrap_or(scheme.error_stripe),
      folded_text:  self.folded_text.unwrap_or(scheme.folded_text),
    }
  }
}

#[derive(Debug)]
pub enum ConfigLoadError {
  BadConfig(TomlError),
  Error(IOError),
}

impl fmt::Display for ConfigLoadError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::BadConfig(err) => write!(f, "Failed to parse outline config: {err}"),
      Self::Error(err) => write!(f, "Failed to read outline config: {err}"),
    }
  }
}

impl std::error::Error for ConfigLoadError {}

impl From<ConfigLoadError> for OutlineError {
  fn from(err: ConfigLoadError) -> Self {
    OutlineError::Config(err.to_string())
  }
}

impl OutlineConfig {
  /// Merge the global and local configuration sources.
  ///
  /// A malformed file is an error even when the other one is fine. A source
  /// that could not be read is skipped; if neither could be read the global
  /// read error is returned.
  pub fn load(
    global: std::result::Result<String, ConfigLoadError>,
    local: std::result::Result<String, ConfigLoadError>,
  ) -> std::result::Result<Self, ConfigLoadError> {
    let parse = |file: String| toml::from_str::<Value>(&file).map_err(ConfigLoadError::BadConfig);
    let global = global.and_then(parse);
    let local = local.and_then(parse);

    let merged = match (global, local) {
      (Ok(global), Ok(local)) => merge_toml_values(global, local),
      (_, Err(ConfigLoadError::BadConfig(err))) | (Err(ConfigLoadError::BadConfig(err)), _) => {
        return Err(ConfigLoadError::BadConfig(err));
      },
      (Ok(value), Err(_)) | (Err(_), Ok(value)) => value,
      (Err(err), Err(_)) => return Err(err),
    };

    let config: Self = merged.try_into().map_err(ConfigLoadError::BadConfig)?;
    Ok(config)
  }

  /// Read and merge the files at `global` and `local`.
  pub fn load_files(global: &Path, local: &Path) -> std::result::Result<Self, ConfigLoadError> {
    Self::load(
      fs::read_to_string(global).map_err(ConfigLoadError::Error),
      fs::read_to_string(local).map_err(ConfigLoadError::Error),
    )
  }

  pub fn validate(&self) -> Result<()> {
    if self.trailing_lines > MAX_TRAILING_LINES {
      return Err(OutlineError::Config(format!(
        "trailing-lines must be at most {MAX_TRAILING_LINES}, got {}",
        self.trailing_lines
      )));
    }
    Ok(())
  }

  pub fn prefs(&self) -> OutlinePrefs {
    OutlinePrefs {
      animated:                 self.animated_scroll,
      highlight_line:           self.highlight_current_line,
      extend_error_highlights:  self.extend_error_highlights,
      lighten_outside_viewport: self.lighten_outside_viewport,
    }
  }
}

/// Merge `right` onto `left`. Tables are merged key by key at every depth;
/// any other value in `right` replaces the one in `left`.
fn merge_toml_values(left: Value, right: Value) -> Value {
  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) => {
      for (name, rvalue) in right_map {
        let merged = match left_map.remove(&name) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue),
          None => rvalue,
        };
        left_map.insert(name, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}

/// The user-facing toggles of a live panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlinePrefs {
  animated:                 bool,
  highlight_line:           bool,
  extend_error_highlights:  bool,
  lighten_outside_viewport: bool,
}

impl Default for OutlinePrefs {
  fn default() -> Self {
    OutlineConfig::default().prefs()
  }
}

macro_rules! pref {
  ($get:ident, $set:ident) => {
    pub fn $get(&self) -> bool {
      self.$get
    }

    /// Returns whether the value changed.
    pub fn $set(&mut self, value: bool) -> bool {
      std::mem::replace(&mut self.$get, value) != value
    }
  };
}

impl OutlinePrefs {
  pref!(animated, set_animated);
  pref!(highlight_line, set_highlight_line);
  pref!(extend_error_highlights, set_extend_error_highlights);
  pref!(lighten_outside_viewport, set_lighten_outside_viewport);
}
