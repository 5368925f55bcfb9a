//! Small geometry and colour types shared by the outline components.
//!
//! Panel and miniature coordinates are integer pixels. Conversions into
//! `tiny_skia` types live here so the drawing code never juggles `f32`
//! rectangles directly.

use std::{
  fmt,
  str::FromStr,
};

use serde::{
  Deserialize,
  Deserializer,
};

/// An RGBA colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Color {
  pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
  pub const YELLOW: Self = Self::rgb(255, 255, 0);

  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 255 }
  }

  pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  /// Same colour with a different alpha.
  pub const fn with_alpha(self, a: u8) -> Self {
    Self { a, ..self }
  }

  pub fn to_skia(self) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.a == 255 {
      write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    } else {
      write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "invalid colour `{}`, expected #rrggbb or #rrggbbaa", self.0)
  }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
  type Err = ParseColorError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let err = || ParseColorError(s.to_string());
    let hex = s.strip_prefix('#').ok_or_else(err)?;
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
      return Err(err());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
  }
}

impl<'de> Deserialize<'de> for Color {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// A point in panel or miniature pixel space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
  pub x: i32,
  pub y: i32,
}

impl Point {
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
  pub width:  u32,
  pub height: u32,
}

impl Size {
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  pub const fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  /// Whether `other` fits inside `self` in both dimensions.
  pub const fn contains(&self, other: Size) -> bool {
    self.width >= other.width && self.height >= other.height
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
  pub x:      i32,
  pub y:      i32,
  pub width:  u32,
  pub height: u32,
}

impl Rect {
  pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub const fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  pub fn right(&self) -> i32 {
    self.x.saturating_add(self.width as i32)
  }

  pub fn bottom(&self) -> i32 {
    self.y.saturating_add(self.height as i32)
  }

  /// `None` for empty rectangles, which `tiny_skia` refuses to fill anyway.
  pub fn to_skia(self) -> Option<tiny_skia::Rect> {
    if self.is_empty() {
      return None;
    }
    tiny_skia::Rect::from_xywh(
      self.x as f32,
      self.y as f32,
      self.width as f32,
      self.height as f32,
    )
  }
}

/// Fill `rect` on `pixmap` with hard pixel edges. Parts outside the pixmap
/// are clipped.
pub fn fill_rect(pixmap: &mut tiny_skia::Pixmap, rect: Rect, color: Color) {
  let Some(rect) = rect.to_skia() else {
    return;
  };
  let mut paint = tiny_skia::Paint::default();
  paint.set_color(color.to_skia());
  paint.anti_alias = false;
  pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
}

/// A line/column position in the host document, both 0-indexed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalPosition {
  pub line:   usize,
  pub column: usize,
}

impl LogicalPosition {
  pub const fn new(line: usize, column: usize) -> Self {
    Self { line, column }
  }

  pub const fn zero() -> Self {
    Self { line: 0, column: 0 }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_hex_colors() {
    assert_eq!("#ff0080".parse::<Color>(), Ok(Color::rgb(255, 0, 128)));
    assert_eq!("#ff008040".parse::<Color>(), Ok(Color::rgba(255, 0, 128, 64)));
    assert!("ff0080".parse::<Color>().is_err());
    assert!("#ff00".parse::<Color>().is_err());
    assert!("#gg0000".parse::<Color>().is_err());
  }

  #[test]
  fn display_round_trips_through_parse() {
    for color in [Color::rgb(1, 2, 3), Color::rgba(10, 20, 30, 40)] {
      assert_eq!(color.to_string().parse::<Color>(), Ok(color));
    }
  }

  #[test]
  fn empty_rect_has_no_skia_rect() {
    assert!(Rect::new(0, 0, 0, 4).to_skia().is_none());
    assert!(Rect::new(2, 3, 4, 5).to_skia().is_some());
  }

  #[test]
  fn fill_rect_clips_to_pixmap() {
    let mut pixmap = tiny_skia::Pixmap::new(4, 4).unwrap();
    fill_rect(&mut pixmap, Rect::new(-2, 3, 10, 5), Color::rgb(255, 0, 0));
    assert_eq!(pixmap.pixel(0, 3).unwrap().red(), 255);
    assert_eq!(pixmap.pixel(3, 3).unwrap().alpha(), 255);
    assert_eq!(pixmap.pixel(0, 2).unwrap().alpha(), 0);
  }

  #[test]
  fn size_contains() {
    assert!(Size::new(10, 10).contains(Size::new(10, 4)));
    assert!(!Size::new(10, 10).contains(Size::new(11, 4)));
  }
}
