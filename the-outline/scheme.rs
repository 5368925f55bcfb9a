//! Colours the outline pulls from the host's editor colour scheme.

use serde::Deserialize;

use crate::graphics::Color;

/// The subset of the host colour scheme the outline paints with.
///
/// Every field can be overridden from the `[colors]` table of the outline
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ColorScheme {
  /// Editor background. Spans whose background equals this draw no band.
  pub background:   Color,
  /// Glyph colour for spans that carry no foreground of their own.
  pub foreground:   Color,
  pub caret:        Color,
  /// Band behind each caret line.
  pub caret_row:    Color,
  pub selection:    Color,
  pub right_margin: Color,
  /// Fallback for error markers without a stripe colour.
  pub error_stripe: Color,
  /// Placeholder text of collapsed folds.
  pub folded_text:  Color,
}

impl Default for ColorScheme {
  fn default() -> Self {
    Self {
      background:   Color::rgb(255, 255, 255),
      foreground:   Color::rgb(0, 0, 0),
      caret:        Color::rgb(0, 0, 0),
      caret_row:    Color::rgb(255, 255, 215),
      selection:    Color::rgb(166, 210, 255),
      right_margin: Color::rgb(192, 192, 192),
      error_stripe: Color::YELLOW,
      folded_text:  Color::rgb(128, 128, 128),
    }
  }
}

impl ColorScheme {
  /// Colour of the dimming mask painted outside the viewport.
  pub fn viewport_mask(&self) -> Color {
    self.background.with_alpha(180)
  }

  /// Outline of the current viewport rectangle.
  pub fn viewport_outline(&self) -> Color {
    self.caret.with_alpha(50)
  }

  /// Fill of the pre-preview viewport while a preview scroll is active.
  pub fn viewport_ghost(&self) -> Color {
    self.caret.with_alpha(20)
  }
}
