//! Narrow views of the host editor the outline depends on.
//!
//! The outline never touches concrete host types. Each collaborator is a small
//! trait so a real editor adapter and the in-memory host used by tests and the
//! CLI are interchangeable.

use std::{
  borrow::Cow,
  fmt,
  ops::Range,
};

use crossbeam::channel::Sender;

use crate::{
  fold::FoldRegion,
  graphics::{
    Color,
    LogicalPosition,
    Point,
    Rect,
    Size,
  },
  scheme::ColorScheme,
};

/// Offsets of one line. `end` includes the line separator, so
/// `end - separator_len` is where the visible content stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineBounds {
  pub start:         usize,
  pub end:           usize,
  pub separator_len: usize,
}

impl LineBounds {
  pub fn content_end(&self) -> usize {
    self.end.saturating_sub(self.separator_len).max(self.start)
  }
}

/// Read access to the document text. Offsets are char indices.
pub trait DocumentSource {
  fn len_chars(&self) -> usize;

  fn line_count(&self) -> usize;

  /// Bounds of `line`. Out of range lines yield an empty range at the end of
  /// the document.
  fn line_bounds(&self, line: usize) -> LineBounds;

  fn line_of_offset(&self, offset: usize) -> usize;

  fn slice(&self, range: Range<usize>) -> Cow<'_, str>;

  fn position_of_offset(&self, offset: usize) -> LogicalPosition {
    let line = self.line_of_offset(offset);
    let start = self.line_bounds(line).start;
    LogicalPosition::new(line, offset.saturating_sub(start))
  }
}

pub trait FoldSource {
  /// All fold regions ordered by start offset, non-overlapping.
  fn fold_regions(&self) -> Vec<FoldRegion>;
}

/// A run of text sharing one set of colour attributes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
  pub start:        usize,
  pub end:          usize,
  pub foreground:   Option<Color>,
  pub background:   Option<Color>,
  pub effect:       Option<Color>,
  pub error_stripe: Option<Color>,
}

impl HighlightSpan {
  pub fn plain(range: Range<usize>) -> Self {
    Self {
      start: range.start,
      end: range.end,
      ..Self::default()
    }
  }
}

pub trait HighlightSource {
  /// Spans tiling `range` in offset order, without gaps or overlaps.
  fn spans(&self, range: Range<usize>) -> Vec<HighlightSpan>;
}

/// Highlight source for hosts without highlighting: a single uncoloured span
/// covering the requested range.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlights;

impl HighlightSource for PlainHighlights {
  fn spans(&self, range: Range<usize>) -> Vec<HighlightSpan> {
    if range.is_empty() {
      return Vec::new();
    }
    vec![HighlightSpan::plain(range)]
  }
}

/// An error or warning marker from the host's markup model.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Marker {
  pub start:        usize,
  pub end:          usize,
  pub stripe_color: Option<Color>,
  pub description:  Option<String>,
  /// Thin stripe marks are informational and never extended across lines.
  pub thin:         bool,
  pub valid:        bool,
}

impl Marker {
  /// Whether the marker gets a full-width band in the outline.
  pub fn is_extendable(&self) -> bool {
    self.valid && !self.thin && self.description.is_some()
  }
}

pub trait MarkupSource {
  /// Current markers ordered by start offset.
  fn markers(&self) -> Vec<Marker>;
}

pub trait ScrollModel {
  /// Visible area in editor content coordinates.
  fn visible_area(&self) -> Rect;

  /// Size of the whole editor content component.
  fn content_size(&self) -> Size;

  fn scroll_offset(&self) -> Point;

  /// Scroll so `pos` sits in the middle of the visible area.
  fn scroll_to(&mut self, pos: LogicalPosition, animated: bool);

  fn scroll_to_offset(&mut self, offset: Point, animated: bool);
}

pub trait SelectionSource {
  /// Selected ranges. Block selections yield one range per row.
  fn selections(&self) -> Vec<Range<usize>>;

  fn carets(&self) -> Vec<LogicalPosition>;
}

/// Highlight of the host line currently under the mouse.
pub trait LineHighlighter {
  fn highlight_line(&mut self, line: usize);

  fn clear_line_highlight(&mut self);
}

/// Change notifications the host pushes to the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
  DocumentChanged {
    offset:  usize,
    old_len: usize,
    new_len: usize,
  },
  FoldsChanged,
  VisibleAreaChanged,
  SelectionChanged,
  CaretsChanged,
  MarkupChanged,
}

impl HostEvent {
  /// Events after which the cached miniature no longer matches the document.
  /// Markup changes recolour the background bands.
  pub fn invalidates_raster(&self) -> bool {
    matches!(
      self,
      Self::DocumentChanged { .. } | Self::FoldsChanged | Self::MarkupChanged
    )
  }
}

pub type EventSender = Sender<HostEvent>;

/// Keeps a host listener registration alive. Dropping it unregisters the
/// listener, so every teardown path releases it.
#[must_use = "dropping a subscription unregisters the listener"]
pub struct Subscription {
  release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
  pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
    Self {
      release: Some(Box::new(release)),
    }
  }

  /// A subscription with nothing to release.
  pub fn detached() -> Self {
    Self { release: None }
  }

  pub fn is_active(&self) -> bool {
    self.release.is_some()
  }

  /// Unregister now. Safe to call more than once.
  pub fn unsubscribe(&mut self) {
    if let Some(release) = self.release.take() {
      release();
    }
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.unsubscribe();
  }
}

impl fmt::Debug for Subscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Subscription")
      .field("active", &self.is_active())
      .finish()
  }
}

/// Everything the outline panel needs from one editor instance.
pub trait EditorHost:
  DocumentSource
  + FoldSource
  + HighlightSource
  + MarkupSource
  + ScrollModel
  + SelectionSource
  + LineHighlighter
{
  fn color_scheme(&self) -> ColorScheme;

  /// Column of the right margin guide, when the host shows one.
  fn right_margin(&self) -> Option<u32>;

  /// Register `sink` for document, fold, scroll, selection, caret and markup
  /// notifications.
  fn subscribe(&self, sink: EventSender) -> Subscription;
}
