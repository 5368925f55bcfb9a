//! An in-memory host over a [`Rope`].
//!
//! Used by the tests and by the headless CLI. Scrolling is modelled with a
//! fixed line height and character width; scroll requests are applied
//! immediately and recorded so callers can inspect them.

use std::{
  borrow::Cow,
  ops::Range,
  sync::{
    Arc,
    atomic::{
      AtomicU64,
      Ordering,
    },
  },
};

use parking_lot::Mutex;
use ropey::Rope;

use crate::{
  fold::{
    FoldMap,
    FoldRegion,
  },
  graphics::{
    LogicalPosition,
    Point,
    Rect,
    Size,
  },
  host::{
    DocumentSource,
    EditorHost,
    EventSender,
    FoldSource,
    HighlightSource,
    HighlightSpan,
    HostEvent,
    LineBounds,
    LineHighlighter,
    Marker,
    MarkupSource,
    PlainHighlights,
    ScrollModel,
    SelectionSource,
    Subscription,
  },
  scheme::ColorScheme,
};

/// Document text backed by a rope.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocument {
  text: Rope,
}

impl MemoryDocument {
  pub fn new(text: Rope) -> Self {
    Self { text }
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  /// Replace `range` with `replacement`, returning the change as a host event.
  pub fn edit(&mut self, range: Range<usize>, replacement: &str) -> HostEvent {
    let len = self.text.len_chars();
    let start = range.start.min(len);
    let end = range.end.clamp(start, len);
    self.text.remove(start..end);
    self.text.insert(start, replacement);
    HostEvent::DocumentChanged {
      offset:  start,
      old_len: end - start,
      new_len: replacement.chars().count(),
    }
  }
}

fn is_line_break(ch: char) -> bool {
  matches!(
    ch,
    '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
  )
}

impl DocumentSource for MemoryDocument {
  fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  fn line_count(&self) -> usize {
    self.text.len_lines()
  }

  fn line_bounds(&self, line: usize) -> LineBounds {
    let len = self.text.len_chars();
    if line >= self.text.len_lines() {
      return LineBounds {
        start:         len,
        end:           len,
        separator_len: 0,
      };
    }

    let start = self.text.line_to_char(line);
    let end = if line + 1 < self.text.len_lines() {
      self.text.line_to_char(line + 1)
    } else {
      len
    };

    let mut tail = self.text.slice(start..end).chars_at(end - start).reversed();
    let separator_len = match (tail.next(), tail.next()) {
      (Some('\n'), Some('\r')) => 2,
      (Some(ch), _) if is_line_break(ch) => 1,
      _ => 0,
    };

    LineBounds {
      start,
      end,
      separator_len,
    }
  }

  fn line_of_offset(&self, offset: usize) -> usize {
    self.text.char_to_line(offset.min(self.text.len_chars()))
  }

  fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
    let len = self.text.len_chars();
    let start = range.start.min(len);
    let end = range.end.clamp(start, len);
    self.text.slice(start..end).into()
  }
}

/// A scroll request as the host received it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRequest {
  Centered {
    position: LogicalPosition,
    animated: bool,
  },
  Offset {
    offset:   Point,
    animated: bool,
  },
}

impl ScrollRequest {
  pub fn is_animated(&self) -> bool {
    match *self {
      Self::Centered { animated, .. } | Self::Offset { animated, .. } => animated,
    }
  }
}

type Subscribers = Arc<Mutex<Vec<(u64, EventSender)>>>;

/// A complete editor host held in memory.
pub struct MemoryHost {
  pub document:         MemoryDocument,
  pub folds:            Vec<FoldRegion>,
  /// Explicit highlight spans. `None` renders everything in the default
  /// foreground.
  pub spans:            Option<Vec<HighlightSpan>>,
  pub markers:          Vec<Marker>,
  pub selections:       Vec<Range<usize>>,
  pub carets:           Vec<LogicalPosition>,
  pub scheme:           ColorScheme,
  pub right_margin:     Option<u32>,
  /// Editor line height in content pixels.
  pub line_height:      u32,
  /// Editor character width in content pixels.
  pub char_width:       u32,
  /// Size of the editor viewport.
  pub viewport:         Size,
  pub highlighted_line: Option<usize>,
  pub scroll_requests:  Vec<ScrollRequest>,
  offset:               Point,
  subscribers:          Subscribers,
  next_subscriber:      AtomicU64,
}

impl MemoryHost {
  pub fn new(text: &str) -> Self {
    Self {
      document:         MemoryDocument::new(Rope::from(text)),
      folds:            Vec::new(),
      spans:            None,
      markers:          Vec::new(),
      selections:       Vec::new(),
      carets:           vec![LogicalPosition::zero()],
      scheme:           ColorScheme::default(),
      right_margin:     None,
      line_height:      16,
      char_width:       8,
      viewport:         Size::new(800, 600),
      highlighted_line: None,
      scroll_requests:  Vec::new(),
      offset:           Point::default(),
      subscribers:      Arc::default(),
      next_subscriber:  AtomicU64::new(0),
    }
  }

  /// Deliver `event` to every live subscriber. Disconnected receivers are
  /// pruned.
  pub fn notify(&self, event: HostEvent) {
    self
      .subscribers
      .lock()
      .retain(|(_, sender)| sender.send(event).is_ok());
  }

  pub fn subscriber_count(&self) -> usize {
    self.subscribers.lock().len()
  }

  pub fn edit(&mut self, range: Range<usize>, replacement: &str) {
    let event = self.document.edit(range, replacement);
    self.notify(event);
  }

  pub fn set_folds(&mut self, folds: Vec<FoldRegion>) {
    self.folds = folds;
    self.notify(HostEvent::FoldsChanged);
  }

  pub fn set_selections(&mut self, selections: Vec<Range<usize>>) {
    self.selections = selections;
    self.notify(HostEvent::SelectionChanged);
  }

  pub fn set_carets(&mut self, carets: Vec<LogicalPosition>) {
    self.carets = carets;
    self.notify(HostEvent::CaretsChanged);
  }

  pub fn set_markers(&mut self, markers: Vec<Marker>) {
    self.markers = markers;
    self.notify(HostEvent::MarkupChanged);
  }

  fn fold_map(&self) -> FoldMap {
    FoldMap::new(&self.document, self.folds.clone())
  }

  fn max_offset(&self) -> Point {
    let content = self.content_size();
    Point::new(
      content.width.saturating_sub(self.viewport.width) as i32,
      content.height.saturating_sub(self.viewport.height) as i32,
    )
  }

  fn apply_offset(&mut self, offset: Point) {
    let max = self.max_offset();
    let offset = Point::new(offset.x.clamp(0, max.x), offset.y.clamp(0, max.y));
    if offset != self.offset {
      self.offset = offset;
      self.notify(HostEvent::VisibleAreaChanged);
    }
  }
}

impl DocumentSource for MemoryHost {
  fn len_chars(&self) -> usize {
    self.document.len_chars()
  }

  fn line_count(&self) -> usize {
    self.document.line_count()
  }

  fn line_bounds(&self, line: usize) -> LineBounds {
    self.document.line_bounds(line)
  }

  fn line_of_offset(&self, offset: usize) -> usize {
    self.document.line_of_offset(offset)
  }

  fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
    self.document.slice(range)
  }
}

impl FoldSource for MemoryHost {
  fn fold_regions(&self) -> Vec<FoldRegion> {
    self.folds.clone()
  }
}

impl HighlightSource for MemoryHost {
  fn spans(&self, range: Range<usize>) -> Vec<HighlightSpan> {
    let Some(spans) = &self.spans else {
      return PlainHighlights.spans(range);
    };
    spans
      .iter()
      .filter(|span| span.start < range.end && span.end > range.start)
      .map(|span| {
        HighlightSpan {
          start: span.start.max(range.start),
          end: span.end.min(range.end),
          ..span.clone()
        }
      })
      .collect()
  }
}

impl MarkupSource for MemoryHost {
  fn markers(&self) -> Vec<Marker> {
    let mut markers = self.markers.clone();
    markers.sort_by_key(|marker| marker.start);
    markers
  }
}

impl ScrollModel for MemoryHost {
  fn visible_area(&self) -> Rect {
    Rect::new(
      self.offset.x,
      self.offset.y,
      self.viewport.width,
      self.viewport.height,
    )
  }

  fn content_size(&self) -> Size {
    let rows = self.fold_map().folded_line_count(self.line_count()) as u32;
    let widest = (0..self.line_count())
      .map(|line| {
        let bounds = self.line_bounds(line);
        bounds.content_end() - bounds.start
      })
      .max()
      .unwrap_or(0) as u32;
    Size::new(
      (widest * self.char_width).max(self.viewport.width),
      (rows * self.line_height).max(self.viewport.height),
    )
  }

  fn scroll_offset(&self) -> Point {
    self.offset
  }

  fn scroll_to(&mut self, position: LogicalPosition, animated: bool) {
    self
      .scroll_requests
      .push(ScrollRequest::Centered { position, animated });
    let row = self.fold_map().folded_line_of(position.line) as i32;
    let line_height = self.line_height as i32;
    let y = row * line_height + line_height / 2 - self.viewport.height as i32 / 2;
    self.apply_offset(Point::new(self.offset.x, y));
  }

  fn scroll_to_offset(&mut self, offset: Point, animated: bool) {
    self
      .scroll_requests
      .push(ScrollRequest::Offset { offset, animated });
    self.apply_offset(offset);
  }
}

impl SelectionSource for MemoryHost {
  fn selections(&self) -> Vec<Range<usize>> {
    self.selections.clone()
  }

  fn carets(&self) -> Vec<LogicalPosition> {
    self.carets.clone()
  }
}

impl LineHighlighter for MemoryHost {
  fn highlight_line(&mut self, line: usize) {
    self.highlighted_line = Some(line);
  }

  fn clear_line_highlight(&mut self) {
    self.highlighted_line = None;
  }
}

impl EditorHost for MemoryHost {
  fn color_scheme(&self) -> ColorScheme {
    self.scheme.clone()
  }

  fn right_margin(&self) -> Option<u32> {
    self.right_margin
  }

  fn subscribe(&self, sink: EventSender) -> Subscription {
    let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
    self.subscribers.lock().push((id, sink));
    let subscribers = Arc::clone(&self.subscribers);
    Subscription::new(move || {
      subscribers.lock().retain(|(other, _)| *other != id);
    })
  }
}
