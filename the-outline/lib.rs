//! A miniature document outline for editor side panels.
//!
//! The outline keeps a cached two-layer raster of the whole document (glyphs
//! and background bands, two pixel rows per line), composites live selection,
//! caret, marker and viewport overlays over it on every paint, and maps pointer
//! input on the miniature back to scroll commands for the host editor.
//!
//! The host is reached only through the traits in [`host`]. [`memory`] provides
//! an in-memory host for tests and headless use.

pub mod config;
pub mod error;
pub mod fault;
pub mod fold;
pub mod graphics;
pub mod host;
pub mod memory;
pub mod panel;
pub mod preview;
pub mod raster;
pub mod rasterizer;
pub mod renderer;
pub mod scheme;
pub mod viewport;

/// Miniature pixel rows per document line: one glyph row, one band row.
pub const ROW_HEIGHT: i32 = 2;

pub use config::{
  ConfigLoadError,
  OutlineConfig,
  OutlinePrefs,
};
pub use error::{
  OutlineError,
  Result,
};
pub use fault::{
  FaultPolicy,
  FaultReporter,
  FaultSink,
};
pub use fold::{
  FoldLines,
  FoldMap,
  FoldRegion,
};
pub use graphics::{
  Color,
  LogicalPosition,
  Point,
  Rect,
  Size,
};
pub use host::{
  EditorHost,
  HostEvent,
  Subscription,
};
pub use panel::OutlinePanel;
pub use preview::{
  Modifiers,
  PointerButton,
  PointerEvent,
  PointerOutcome,
  PreviewScroll,
};
pub use raster::{
  RasterCache,
  RasterPair,
};
pub use rasterizer::{
  RasterStats,
  Rasterizer,
};
pub use renderer::OutlineRenderer;
pub use scheme::ColorScheme;
pub use viewport::ViewportGeometry;
