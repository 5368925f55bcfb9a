//! Mapping between the host's scroll geometry and miniature space.
//!
//! The miniature is usually taller than the panel. While the host scrolls
//! through its content, the miniature is slid upwards by the same fraction of
//! its overflow, and the rectangle marking the host viewport moves down the
//! panel by the same fraction.

use crate::{
  ROW_HEIGHT,
  fold::FoldMap,
  graphics::{
    LogicalPosition,
    Point,
    Rect,
    Size,
  },
  host::ScrollModel,
};

/// Widens the viewport rectangle so its aspect roughly matches the text under
/// it. Two pixel rows per line and one pixel per column squash the miniature
/// vertically compared to the editor; the factor is empirical.
pub const ASPECT_CORRECTION: f64 = 1.22;

/// Host scroll state paired with the miniature it is drawn over.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewportGeometry {
  /// Size of the whole host content component.
  pub content:      Size,
  /// Host visible area in content coordinates.
  pub visible_area: Rect,
  /// Panel width and the height the full miniature requires.
  pub target:       Size,
  pub panel_height: u32,
}

impl ViewportGeometry {
  pub fn new(content: Size, visible_area: Rect, target: Size, panel_height: u32) -> Self {
    Self {
      content,
      visible_area,
      target,
      panel_height,
    }
  }

  pub fn from_host<S: ScrollModel + ?Sized>(host: &S, target: Size, panel_height: u32) -> Self {
    Self::new(
      host.content_size(),
      host.visible_area(),
      target,
      panel_height,
    )
  }

  /// How far the host is scrolled, from 0 at the top to 1 at the bottom.
  ///
  /// Content that fits entirely in the visible area cannot scroll and yields 0.
  pub fn scroll_fraction(&self) -> f64 {
    let scrollable = self.content.height as f64 - self.visible_area.height as f64;
    if scrollable <= 0.0 {
      return 0.0;
    }
    (self.visible_area.y as f64 / scrollable).clamp(0.0, 1.0)
  }

  /// The host viewport in panel coordinates.
  pub fn proportional_rect(&self) -> Rect {
    if self.content.is_empty() || self.visible_area.is_empty() {
      return Rect::default();
    }

    let visible_width = self.visible_area.width as f64;
    let visible_height = self.visible_area.height as f64;
    let target_height = self.target.height as f64;

    let height = (visible_height * target_height / self.content.height as f64).min(target_height);
    let width = visible_width / visible_height * height * ASPECT_CORRECTION;
    let x = self.visible_area.x as f64 * self.target.width as f64 / self.content.width as f64;
    let y = (self.panel_height.min(self.target.height) as f64 - height) * self.scroll_fraction();

    Rect::new(x as i32, y as i32, width as u32, height as u32)
  }

  /// Vertical shift applied to the miniature when it overflows the panel.
  /// Never positive.
  pub fn y_offset(&self) -> i32 {
    let overflow = self.target.height as f64 - self.panel_height as f64;
    (-overflow * self.scroll_fraction()).min(0.0) as i32
  }
}

/// Host position under a panel point, given the miniature's current
/// `y_offset`.
///
/// Rows map to folded lines, which are then resolved to the host line shown
/// there. Every column is one pixel wide; the x coordinate is halved to stay
/// in proportion with the two pixel rows per line.
pub fn miniature_to_host(point: Point, y_offset: i32, folds: &FoldMap) -> LogicalPosition {
  let row = (point.y - y_offset).max(0) / ROW_HEIGHT;
  let column = point.x.max(0) / 2;
  let line = folds.unfolded_line_of(row as usize);
  LogicalPosition::new(line, column as usize)
}

#[cfg(test)]
mod tests {
  use quickcheck::TestResult;

  use super::*;
  use crate::fold::FoldLines;

  fn geometry(scroll_y: i32) -> ViewportGeometry {
    ViewportGeometry::new(
      Size::new(800, 16_000),
      Rect::new(0, scroll_y, 800, 600),
      Size::new(120, 2_012),
      500,
    )
  }

  #[test]
  fn unscrolled_rect_sits_at_origin() {
    let rect = geometry(0).proportional_rect();
    assert_eq!((rect.x, rect.y), (0, 0));
    // 600 * 2012 / 16000
    assert_eq!(rect.height, 75);
    assert_eq!(rect.width, (800.0 / 600.0 * 75.45 * ASPECT_CORRECTION) as u32);
  }

  #[test]
  fn fully_scrolled_rect_touches_panel_bottom() {
    let g = geometry(16_000 - 600);
    assert_eq!(g.scroll_fraction(), 1.0);
    let rect = g.proportional_rect();
    assert!(rect.bottom() <= 500);
    assert!(rect.bottom() >= 499);
    assert_eq!(g.y_offset(), -(2_012 - 500));
  }

  #[test]
  fn short_documents_do_not_scroll() {
    let g = ViewportGeometry::new(
      Size::new(800, 600),
      Rect::new(0, 0, 800, 600),
      Size::new(120, 40),
      500,
    );
    assert_eq!(g.scroll_fraction(), 0.0);
    assert_eq!(g.y_offset(), 0);
    assert!(g.proportional_rect().height <= 40);
  }

  #[test]
  fn empty_content_has_empty_rect() {
    assert!(ViewportGeometry::default().proportional_rect().is_empty());
  }

  #[test]
  fn origin_maps_back_to_start_of_document() {
    let g = geometry(0);
    let rect = g.proportional_rect();
    let pos = miniature_to_host(Point::new(rect.x, rect.y), g.y_offset(), &FoldMap::identity());
    assert_eq!(pos, LogicalPosition::zero());
  }

  #[test]
  fn clicks_follow_scrolled_miniature() {
    // miniature slid up by 100 px, so panel row 0 shows line 50
    let pos = miniature_to_host(Point::new(9, 0), -100, &FoldMap::identity());
    assert_eq!(pos, LogicalPosition::new(50, 4));
  }

  #[test]
  fn clicks_below_a_fold_skip_hidden_lines() {
    let lines = [FoldLines::collapsed(5, 10)];
    assert_eq!(crate::fold::unfolded_line_of(6, &lines), 11);
    let doc = crate::memory::MemoryDocument::new(ropey::Rope::from("x\n".repeat(20)));
    // offsets: line n starts at 2n
    let folds = FoldMap::new(&doc, vec![crate::fold::FoldRegion::collapsed(11, 20, "...")]);
    let pos = miniature_to_host(Point::new(0, 13), 0, &folds);
    assert_eq!(pos.line, 11);
  }

  quickcheck::quickcheck! {
    fn rect_height_never_exceeds_target(
      content_h: u16,
      visible_h: u16,
      scroll_y: u16,
      target_h: u16,
      panel_h: u16
    ) -> TestResult {
      if content_h == 0 || visible_h == 0 {
        return TestResult::discard();
      }
      let g = ViewportGeometry::new(
        Size::new(800, content_h as u32),
        Rect::new(0, scroll_y as i32, 640, visible_h as u32),
        Size::new(100, target_h as u32),
        panel_h as u32,
      );
      TestResult::from_bool(g.proportional_rect().height <= target_h as u32)
    }

    fn rect_stays_in_panel_at_bottom(content_h: u16, visible_h: u16, target_h: u16, panel_h: u16) -> TestResult {
      if visible_h == 0 || content_h <= visible_h {
        return TestResult::discard();
      }
      let g = ViewportGeometry::new(
        Size::new(800, content_h as u32),
        Rect::new(0, (content_h - visible_h) as i32, 640, visible_h as u32),
        Size::new(100, target_h as u32),
        panel_h as u32,
      );
      TestResult::from_bool(g.proportional_rect().bottom() <= panel_h as i32)
    }
  }
}
