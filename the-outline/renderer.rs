//! Compositing the cached miniature with the live overlays.
//!
//! Back to front: background fill, band layer, caret rows, marker bands, right
//! margin, selections, glyph layer, carets, the dimming mask outside the
//! viewport, the viewport outline and, during a preview, the ghost of the
//! viewport the preview started from.

use std::ops::Range;

use tiny_skia::{
  Pixmap,
  PixmapPaint,
  Transform,
};

use crate::{
  ROW_HEIGHT,
  config::OutlinePrefs,
  fold::FoldMap,
  graphics::{
    LogicalPosition,
    Rect,
    fill_rect,
  },
  host::{
    DocumentSource,
    Marker,
  },
  raster::RasterPair,
  scheme::ColorScheme,
  viewport::ViewportGeometry,
};

/// Live host state drawn over the miniature.
#[derive(Debug, Default, Clone)]
pub struct Overlays {
  pub carets:       Vec<LogicalPosition>,
  pub selections:   Vec<Range<usize>>,
  pub markers:      Vec<Marker>,
  pub right_margin: Option<u32>,
  /// Viewport rectangle from before the current preview scroll.
  pub ghost:        Option<Rect>,
}

pub struct OutlineRenderer<'a> {
  scheme: &'a ColorScheme,
  prefs:  OutlinePrefs,
}

impl<'a> OutlineRenderer<'a> {
  pub fn new(scheme: &'a ColorScheme, prefs: OutlinePrefs) -> Self {
    Self { scheme, prefs }
  }

  /// Paint one frame into `target`, which is the whole panel. Returns the
  /// viewport rectangle drawn.
  pub fn paint<D: DocumentSource + ?Sized>(
    &self,
    target: &mut Pixmap,
    layers: &RasterPair,
    doc: &D,
    folds: &FoldMap,
    geometry: &ViewportGeometry,
    overlays: &Overlays,
  ) -> Rect {
    let width = target.width();
    let y_offset = geometry.y_offset();
    let row = |line: usize| folds.folded_line_of(line) as i32 * ROW_HEIGHT + y_offset;

    target.fill(self.scheme.background.to_skia());
    draw_layer(target, &layers.bg, y_offset);

    for caret in &overlays.carets {
      let band = Rect::new(0, row(caret.line) + 1, width, 2);
      fill_rect(target, band, self.scheme.caret_row);
    }

    if self.prefs.extend_error_highlights() {
      // insertion order, so later markers paint over earlier ones
      for marker in overlays.markers.iter().filter(|marker| marker.is_extendable()) {
        let first = row(doc.line_of_offset(marker.start));
        let last = row(doc.line_of_offset(marker.end));
        let rows = (last - first) / ROW_HEIGHT + 1;
        let band = Rect::new(0, first, width, (rows * ROW_HEIGHT + 1).max(0) as u32);
        let color = marker.stripe_color.unwrap_or(self.scheme.error_stripe);
        fill_rect(target, band, color);
      }
    }

    if let Some(margin) = overlays.right_margin {
      let guide = Rect::new(margin as i32, 0, 1, target.height());
      fill_rect(target, guide, self.scheme.right_margin);
    }

    for selection in overlays.selections.iter().filter(|range| !range.is_empty()) {
      let from = doc.position_of_offset(selection.start);
      let to = doc.position_of_offset(selection.end);
      for rect in selection_rects(from, to, width, &row) {
        fill_rect(target, rect, self.scheme.selection);
      }
    }

    draw_layer(target, &layers.fg, y_offset);

    for caret in &overlays.carets {
      let mark = Rect::new(caret.column as i32, row(caret.line), 2, 4);
      fill_rect(target, mark, self.scheme.caret);
    }

    let viewport = geometry.proportional_rect();
    if self.prefs.lighten_outside_viewport() {
      self.dim_outside(target, viewport);
    }
    for edge in outline(viewport) {
      fill_rect(target, edge, self.scheme.viewport_outline());
    }
    if let Some(ghost) = overlays.ghost {
      fill_rect(target, ghost, self.scheme.viewport_ghost());
    }

    viewport
  }

  /// Dim everything but the viewport and the one pixel border right and
  /// below it.
  fn dim_outside(&self, target: &mut Pixmap, viewport: Rect) {
    let (width, height) = (target.width() as i32, target.height() as i32);
    let hole = Rect::new(
      viewport.x,
      viewport.y,
      viewport.width + 1,
      viewport.height + 1,
    );
    let color = self.scheme.viewport_mask();
    let span = |from: i32, to: i32| (to - from).max(0) as u32;

    fill_rect(target, Rect::new(0, 0, width as u32, span(0, hole.y)), color);
    fill_rect(
      target,
      Rect::new(0, hole.bottom(), width as u32, span(hole.bottom(), height)),
      color,
    );
    fill_rect(target, Rect::new(0, hole.y, span(0, hole.x), hole.height), color);
    fill_rect(
      target,
      Rect::new(hole.right(), hole.y, span(hole.right(), width), hole.height),
      color,
    );
  }
}

fn draw_layer(target: &mut Pixmap, layer: &Pixmap, y_offset: i32) {
  target.draw_pixmap(
    0,
    y_offset,
    layer.as_ref(),
    &PixmapPaint::default(),
    Transform::identity(),
    None,
  );
}

/// One pixel outline whose right and bottom edges sit on `x + width` and
/// `y + height`.
fn outline(rect: Rect) -> [Rect; 4] {
  let inner = rect.height.saturating_sub(1);
  [
    Rect::new(rect.x, rect.y, rect.width + 1, 1),
    Rect::new(rect.x, rect.bottom(), rect.width + 1, 1),
    Rect::new(rect.x, rect.y + 1, 1, inner),
    Rect::new(rect.right(), rect.y + 1, 1, inner),
  ]
}

/// Selection blocks between two host positions. A selection within one row
/// is a single block; across rows it is the tail of the first row, full rows
/// in between and the head of the last row.
fn selection_rects(
  from: LogicalPosition,
  to: LogicalPosition,
  width: u32,
  row: &impl Fn(usize) -> i32,
) -> Vec<Rect> {
  let first = row(from.line);
  let last = row(to.line);
  let from_col = from.column as i32;
  let to_col = to.column as i32;

  if first == last {
    let width = (to_col - from_col).max(0) as u32;
    return vec![Rect::new(from_col, first + 1, width, 2)];
  }

  let between = ((last - first) / ROW_HEIGHT - 1) * ROW_HEIGHT + 1;
  vec![
    Rect::new(from_col, first + 1, width.saturating_sub(from.column as u32), 2),
    Rect::new(0, first + ROW_HEIGHT, width, between.max(0) as u32),
    Rect::new(0, last + 1, to_col.max(0) as u32, 2),
  ]
}
