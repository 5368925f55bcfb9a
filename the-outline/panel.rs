//! The outline panel attached to one host editor.
//!
//! The panel subscribes to the host on construction and drains the change
//! notifications before every paint. Document and fold changes mark the
//! cached miniature stale; the next paint re-rasterizes it, everything else is
//! recomposited from the cache.

use std::sync::Arc;

use crossbeam::channel::{
  Receiver,
  unbounded,
};
use parking_lot::Mutex;
use tiny_skia::Pixmap;

use crate::{
  ROW_HEIGHT,
  config::{
    ColorOverrides,
    OutlineConfig,
    OutlinePrefs,
  },
  error::{
    OutlineError,
    Result,
  },
  fault::FaultReporter,
  fold::FoldMap,
  graphics::{
    Point,
    Rect,
    Size,
  },
  host::{
    EditorHost,
    HostEvent,
    Subscription,
  },
  preview::{
    PointerContext,
    PointerEvent,
    PointerOutcome,
    PreviewScroll,
  },
  raster::RasterCache,
  rasterizer::{
    RasterStats,
    Rasterizer,
  },
  renderer::{
    OutlineRenderer,
    Overlays,
  },
  scheme::ColorScheme,
  viewport::{
    ViewportGeometry,
    miniature_to_host,
  },
};

/// Result of one successful paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintReport {
  /// Viewport rectangle in panel coordinates.
  pub viewport:   Rect,
  pub y_offset:   i32,
  /// Set when this paint re-rasterized the miniature.
  pub rasterized: Option<RasterStats>,
  /// Size of the full miniature, which may exceed the panel.
  pub miniature:  Size,
}

pub struct OutlinePanel<H: EditorHost> {
  host:           H,
  prefs:          OutlinePrefs,
  trailing_lines: u32,
  colors:         ColorOverrides,
  faults:         Arc<FaultReporter>,
  cache:          Mutex<RasterCache>,
  /// Last pointer position over the panel, `None` once it left.
  hover:          Mutex<Option<Point>>,
  preview:        Mutex<PreviewScroll>,
  /// Panel size at the last paint.
  panel:          Mutex<Size>,
  events:         Receiver<HostEvent>,
  subscription:   Subscription,
}

impl<H: EditorHost> OutlinePanel<H> {
  pub fn new(host: H, config: &OutlineConfig, faults: Arc<FaultReporter>) -> Result<Self> {
    config.validate()?;
    let (sender, events) = unbounded();
    let subscription = host.subscribe(sender);
    Ok(Self {
      host,
      prefs: config.prefs(),
      trailing_lines: config.trailing_lines,
      colors: config.colors.clone(),
      faults,
      cache: Mutex::new(RasterCache::new()),
      hover: Mutex::new(None),
      preview: Mutex::new(PreviewScroll::new()),
      panel: Mutex::new(Size::default()),
      events,
      subscription,
    })
  }

  pub fn host(&self) -> &H {
    &self.host
  }

  /// Mutable host access. Changes made here are only seen by the outline
  /// through the host's own notifications.
  pub fn host_mut(&mut self) -> &mut H {
    &mut self.host
  }

  pub fn prefs(&self) -> OutlinePrefs {
    self.prefs
  }

  pub fn is_disposed(&self) -> bool {
    !self.subscription.is_active()
  }

  /// The host scheme with the configured overrides applied.
  pub fn color_scheme(&self) -> ColorScheme {
    self.colors.apply(self.host.color_scheme())
  }

  /// Replace the preferences and rebuild the miniature on the next paint.
  /// Returns whether anything changed.
  pub fn set_prefs(&mut self, prefs: OutlinePrefs) -> bool {
    if prefs == self.prefs {
      return false;
    }
    if !prefs.highlight_line() {
      self.host.clear_line_highlight();
    }
    self.prefs = prefs;
    self.refresh();
    true
  }

  /// React to one host notification. Returns whether it made the miniature
  /// stale.
  pub fn handle_event(&self, event: HostEvent) -> bool {
    if !event.invalidates_raster() {
      return false;
    }
    log::trace!("outline invalidated by {event:?}");
    self.cache.lock().invalidate();
    true
  }

  /// Handle every queued host notification. Returns the number handled.
  pub fn pump_events(&self) -> usize {
    let mut handled = 0;
    for event in self.events.try_iter() {
      self.handle_event(event);
      handled += 1;
    }
    handled
  }

  /// Throw the miniature away and rebuild it on the next paint.
  pub fn refresh(&self) {
    self.cache.lock().invalidate();
  }

  pub fn raster_generation(&self) -> u64 {
    self.cache.lock().generation()
  }

  fn fold_map(&self) -> FoldMap {
    FoldMap::new(&self.host, self.host.fold_regions())
  }

  /// Miniature size for a panel `width` wide: every shown row plus the lines
  /// the host appends after the document.
  fn miniature_size(&self, folds: &FoldMap, width: u32) -> Size {
    let rows = folds.folded_line_count(self.host.line_count()) as u32 + self.trailing_lines;
    Size::new(width, rows * ROW_HEIGHT as u32)
  }

  fn geometry(&self, folds: &FoldMap, panel: Size) -> ViewportGeometry {
    let miniature = self.miniature_size(folds, panel.width);
    ViewportGeometry::from_host(&self.host, miniature, panel.height)
  }

  /// Paint the panel into `target`. Faults go to the fault reporter and leave
  /// `target` as it was.
  pub fn paint(&self, target: &mut Pixmap) -> Option<PaintReport> {
    match self.try_paint(target) {
      Ok(report) => Some(report),
      Err(err) => {
        self.faults.report(&err);
        None
      },
    }
  }

  pub fn try_paint(&self, target: &mut Pixmap) -> Result<PaintReport> {
    if self.is_disposed() {
      return Err(OutlineError::NotReady);
    }
    self.pump_events();

    let panel = Size::new(target.width(), target.height());
    *self.panel.lock() = panel;

    let folds = self.fold_map();
    let miniature = self.miniature_size(&folds, panel.width);
    let scheme = self.color_scheme();

    let mut cache = self.cache.lock();
    cache.ensure_size(miniature)?;
    let rasterized = if cache.is_dirty() {
      let spans = self.host.spans(0..self.host.len_chars());
      let rasterizer = Rasterizer::new(&scheme);
      Some(cache.rasterize_with(|pair| rasterizer.rasterize(&self.host, &folds, &spans, pair))?)
    } else {
      None
    };
    let layers = cache.layers().ok_or(OutlineError::NotReady)?;

    let geometry = ViewportGeometry::from_host(&self.host, miniature, panel.height);
    let mut preview = self.preview.lock();
    let overlays = Overlays {
      carets:       self.host.carets(),
      selections:   self.host.selections(),
      markers:      self.host.markers(),
      right_margin: self.host.right_margin(),
      ghost:        preview.ghost(),
    };

    let renderer = OutlineRenderer::new(&scheme, self.prefs);
    let viewport = renderer.paint(target, layers, &self.host, &folds, &geometry, &overlays);
    preview.track_viewport(viewport);

    Ok(PaintReport {
      viewport,
      y_offset: geometry.y_offset(),
      rasterized,
      miniature,
    })
  }

  /// Feed pointer input on the panel.
  pub fn pointer(&mut self, event: PointerEvent) -> PointerOutcome {
    if self.is_disposed() {
      return PointerOutcome::Ignored;
    }

    let folds = self.fold_map();
    let panel = *self.panel.get_mut();
    let y_offset = self.geometry(&folds, panel).y_offset();

    match event {
      PointerEvent::Moved { position } | PointerEvent::Dragged { position, .. } => {
        self.hover_at(Some(position), y_offset, &folds);
      },
      PointerEvent::Exited => self.hover_at(None, y_offset, &folds),
      _ => {},
    }

    let cx = PointerContext {
      y_offset,
      folds: &folds,
      animated: self.prefs.animated(),
    };
    self.preview.get_mut().handle(event, &mut self.host, &cx)
  }

  /// Move the hover point and update the host's line highlight to match.
  fn hover_at(&mut self, point: Option<Point>, y_offset: i32, folds: &FoldMap) {
    let mut hover = self.hover.lock();
    *hover = point;
    self.host.clear_line_highlight();

    let Some(point) = *hover else {
      return;
    };
    if !self.prefs.highlight_line() {
      return;
    }
    let line = miniature_to_host(point, y_offset, folds).line;
    if line < self.host.line_count() {
      self.host.highlight_line(line);
    }
  }

  pub fn hover_point(&self) -> Option<Point> {
    *self.hover.lock()
  }

  /// Release the host subscription, the miniature and any line highlight.
  /// Safe to call more than once; dropping the panel does the same.
  pub fn dispose(&mut self) {
    if self.is_disposed() {
      return;
    }
    self.subscription.unsubscribe();
    self.cache.get_mut().release();
    *self.hover.get_mut() = None;
    self.host.clear_line_highlight();
    log::debug!("outline panel disposed");
  }
}

impl<H: EditorHost> Drop for OutlinePanel<H> {
  fn drop(&mut self) {
    self.dispose();
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex as StdMutex;

  use super::*;
  use crate::{
    fault::{
      FaultPolicy,
      FaultSink,
    },
    fold::FoldRegion,
    graphics::{
      Color,
      LogicalPosition,
    },
    host::{
      HighlightSpan,
      ScrollModel,
    },
    memory::{
      MemoryHost,
      ScrollRequest,
    },
    preview::{
      Modifiers,
      PointerButton,
    },
  };

  fn panel(text: &str) -> OutlinePanel<MemoryHost> {
    let mut host = MemoryHost::new(text);
    host.viewport = Size::new(400, 160);
    OutlinePanel::new(host, &OutlineConfig::default(), Arc::new(FaultReporter::log_only())).unwrap()
  }

  fn target() -> Pixmap {
    Pixmap::new(60, 80).unwrap()
  }

  #[test]
  fn first_paint_rasterizes_and_later_paints_reuse_cache() {
    let panel = panel("fn main() {}\n");
    let mut target = target();
    let first = panel.paint(&mut target).unwrap();
    assert!(first.rasterized.is_some());
    // two lines plus six trailing lines, two rows each
    assert_eq!(first.miniature, Size::new(60, 16));

    let second = panel.paint(&mut target).unwrap();
    assert!(second.rasterized.is_none());
    assert_eq!(panel.raster_generation(), 1);
  }

  #[test]
  fn document_edits_invalidate_the_miniature() {
    let mut panel = panel("abc\n");
    let mut target = target();
    panel.paint(&mut target).unwrap();

    panel.host_mut().edit(0..0, "x");
    let report = panel.paint(&mut target).unwrap();
    assert!(report.rasterized.is_some());
    assert_eq!(panel.raster_generation(), 2);
  }

  #[test]
  fn scrolling_and_selection_only_recomposite() {
    let mut panel = panel(&"x\n".repeat(100));
    let mut target = target();
    panel.paint(&mut target).unwrap();

    panel.host_mut().set_selections(vec![0..3]);
    panel.host_mut().scroll_to_offset(Point::new(0, 320), false);
    let report = panel.paint(&mut target).unwrap();
    assert!(report.rasterized.is_none());
  }

  #[test]
  fn markup_changes_recolour_bands() {
    let stripe = Color::rgb(200, 30, 30);
    let mut panel = panel("abcdef\n");
    panel.host_mut().carets = vec![LogicalPosition::new(1, 0)];
    let mut target = target();
    panel.paint(&mut target).unwrap();
    assert_ne!(target.pixel(2, 2).unwrap().red(), stripe.r);

    panel.host_mut().spans = Some(vec![
      HighlightSpan {
        error_stripe: Some(stripe),
        ..HighlightSpan::plain(0..3)
      },
      HighlightSpan::plain(3..7),
    ]);
    panel.host_mut().notify(HostEvent::MarkupChanged);
    let report = panel.paint(&mut target).unwrap();
    assert!(report.rasterized.is_some());
    // band row of the first line, clear of the caret mark on line 1
    let pixel = target.pixel(2, 2).unwrap();
    assert_eq!((pixel.red(), pixel.green(), pixel.blue()), (stripe.r, stripe.g, stripe.b));
  }

  #[test]
  fn fold_changes_resize_the_miniature() {
    let mut panel = panel("a\nb\nc\nd\n");
    let mut target = target();
    let before = panel.paint(&mut target).unwrap();
    panel
      .host_mut()
      .set_folds(vec![FoldRegion::collapsed(1, 5, "...")]);
    let after = panel.paint(&mut target).unwrap();
    assert!(after.rasterized.is_some());
    assert_eq!(before.miniature.height - after.miniature.height, 4);
  }

  #[test]
  fn failed_pass_keeps_previous_layers() {
    #[derive(Default)]
    struct Recorder(StdMutex<usize>);

    impl FaultSink for Arc<Recorder> {
      fn notify(&self, _: &str) {
        *self.0.lock().unwrap() += 1;
      }
    }

    let recorder = Arc::new(Recorder::default());
    let reporter = FaultReporter::new(FaultPolicy::Always, Some(Box::new(recorder.clone())));
    let host = MemoryHost::new("abcdef\n");
    let mut panel = OutlinePanel::new(host, &OutlineConfig::default(), Arc::new(reporter)).unwrap();
    let mut target = target();
    panel.paint(&mut target).unwrap();

    // spans that leave a gap are inconsistent host data
    panel.host_mut().spans = Some(vec![HighlightSpan::plain(0..2), HighlightSpan::plain(3..7)]);
    panel.refresh();
    let err = panel.try_paint(&mut target).unwrap_err();
    assert!(matches!(err, OutlineError::HostState(_)));
    assert!(panel.paint(&mut target).is_none());
    assert_eq!(panel.raster_generation(), 1);
    // logged, not shown to the user
    assert_eq!(*recorder.0.lock().unwrap(), 0);

    panel.host_mut().spans = None;
    let report = panel.paint(&mut target).unwrap();
    assert!(report.rasterized.is_some());
    assert_eq!(panel.raster_generation(), 2);
  }

  #[test]
  fn click_scrolls_host_with_animation_pref() {
    let mut panel = panel(&"x\n".repeat(300));
    let mut target = target();
    panel.paint(&mut target).unwrap();

    let outcome = panel.pointer(PointerEvent::Pressed {
      button:    PointerButton::Primary,
      position:  Point::new(4, 20),
      modifiers: Modifiers::default(),
    });
    assert_eq!(outcome, PointerOutcome::Scrolled);
    assert_eq!(panel.host().scroll_requests, vec![ScrollRequest::Centered {
      position: LogicalPosition::new(10, 2),
      animated: true,
    }]);
  }

  #[test]
  fn hover_highlights_and_exit_clears() {
    let mut panel = panel("a\nb\nc\n");
    let mut target = target();
    panel.paint(&mut target).unwrap();

    panel.pointer(PointerEvent::Moved {
      position: Point::new(3, 4),
    });
    assert_eq!(panel.host().highlighted_line, Some(2));
    assert_eq!(panel.hover_point(), Some(Point::new(3, 4)));

    // past the last line nothing is highlighted
    panel.pointer(PointerEvent::Moved {
      position: Point::new(3, 40),
    });
    assert_eq!(panel.host().highlighted_line, None);

    panel.pointer(PointerEvent::Moved {
      position: Point::new(3, 2),
    });
    panel.pointer(PointerEvent::Exited);
    assert_eq!(panel.host().highlighted_line, None);
    assert_eq!(panel.hover_point(), None);
  }

  #[test]
  fn disabling_line_highlight_clears_it() {
    let mut panel = panel("a\nb\n");
    let mut target = target();
    panel.paint(&mut target).unwrap();
    panel.pointer(PointerEvent::Moved {
      position: Point::new(0, 0),
    });
    assert_eq!(panel.host().highlighted_line, Some(0));

    let mut prefs = panel.prefs();
    prefs.set_highlight_line(false);
    assert!(panel.set_prefs(prefs));
    assert!(!panel.set_prefs(prefs));
    assert_eq!(panel.host().highlighted_line, None);
    assert!(panel.paint(&mut target).unwrap().rasterized.is_some());

    panel.pointer(PointerEvent::Moved {
      position: Point::new(0, 2),
    });
    assert_eq!(panel.host().highlighted_line, None);
  }

  #[test]
  fn dispose_releases_everything_once() {
    let mut panel = panel("a\n");
    let mut target = target();
    panel.paint(&mut target).unwrap();
    assert_eq!(panel.host().subscriber_count(), 1);

    panel.dispose();
    panel.dispose();
    assert!(panel.is_disposed());
    assert_eq!(panel.host().subscriber_count(), 0);
    assert!(matches!(panel.try_paint(&mut target), Err(OutlineError::NotReady)));
    assert_eq!(
      panel.pointer(PointerEvent::Exited),
      PointerOutcome::Ignored
    );
  }

  #[test]
  fn invalid_config_is_rejected() {
    let config = OutlineConfig {
      trailing_lines: u32::MAX,
      ..OutlineConfig::default()
    };
    let result = OutlinePanel::new(MemoryHost::new(""), &config, Arc::new(FaultReporter::log_only()));
    assert!(matches!(result, Err(OutlineError::Config(_))));
  }
}
