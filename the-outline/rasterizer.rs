//! Text to miniature rasterization.
//!
//! One forward pass walks the line boundaries and the highlight spans in
//! lockstep. Each line owns a two pixel row pair: glyphs go on the upper row,
//! background bands on the lower one. Every character is one pixel wide.
//!
//! Collapsed folds are rendered once, as their placeholder text, on the row of
//! the line where they start. The lines they hide take no row.

use crate::{
  ROW_HEIGHT,
  error::{
    OutlineError,
    Result,
  },
  fold::{
    FoldMap,
    FoldRegion,
  },
  graphics::{
    Color,
    Point,
    Rect,
    fill_rect,
  },
  host::{
    DocumentSource,
    HighlightSpan,
  },
  raster::RasterPair,
  scheme::ColorScheme,
};

/// Tabs always expand to this many columns, whatever the host tab size.
pub const TAB_WIDTH: usize = 4;

/// Where the first line's baseline sits in the miniature.
const ORIGIN: Point = Point::new(0, ROW_HEIGHT);

/// Counters for one rasterization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RasterStats {
  /// Miniature rows advanced past.
  pub rows:         usize,
  pub tokens:       usize,
  pub glyph_runs:   usize,
  pub bands:        usize,
  pub placeholders: usize,
}

/// A piece of the document with uniform treatment.
#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
  Text {
    start: usize,
    end:   usize,
    span:  &'a HighlightSpan,
  },
  Fold {
    start:  usize,
    end:    usize,
    region: &'a FoldRegion,
  },
}

impl Segment<'_> {
  fn start(&self) -> usize {
    match *self {
      Self::Text { start, .. } | Self::Fold { start, .. } => start,
    }
  }

  fn end(&self) -> usize {
    match *self {
      Self::Text { end, .. } | Self::Fold { end, .. } => end,
    }
  }
}

/// Highlight spans with collapsed folds cut out and replaced by one segment
/// per fold.
struct Segments<'a> {
  spans: &'a [HighlightSpan],
  folds: &'a FoldMap,
  idx:   usize,
  pos:   usize,
}

impl<'a> Segments<'a> {
  fn new(spans: &'a [HighlightSpan], folds: &'a FoldMap) -> Self {
    Self {
      spans,
      folds,
      idx: 0,
      pos: spans.first().map_or(0, |span| span.start),
    }
  }
}

impl<'a> Iterator for Segments<'a> {
  type Item = Segment<'a>;

  fn next(&mut self) -> Option<Segment<'a>> {
    loop {
      let span = self.spans.get(self.idx)?;
      if span.end <= self.pos {
        self.idx += 1;
        continue;
      }

      if let Some(region) = self.folds.collapsed_at(self.pos) {
        let start = self.pos;
        self.pos = region.end;
        return Some(Segment::Fold {
          start,
          end: region.end,
          region,
        });
      }

      let start = self.pos.max(span.start);
      let end = match self.folds.next_collapsed_from(start) {
        Some(region) if region.start < span.end => region.start,
        _ => span.end,
      };
      self.pos = end;
      if end == span.end {
        self.idx += 1;
      }
      return Some(Segment::Text { start, end, span });
    }
  }
}

/// Check the host's spans tile `0..len` in order.
pub fn validate_spans(spans: &[HighlightSpan], len: usize) -> Result<()> {
  let mut expected = 0;
  for span in spans {
    if span.start != expected {
      return Err(OutlineError::HostState(format!(
        "highlight span starts at {} but the previous one ended at {expected}",
        span.start
      )));
    }
    if span.end < span.start || span.end > len {
      return Err(OutlineError::HostState(format!(
        "highlight span {}..{} is outside the document (length {len})",
        span.start, span.end
      )));
    }
    expected = span.end;
  }
  Ok(())
}

pub fn expand_tabs(text: &str) -> String {
  text.replace('\t', &" ".repeat(TAB_WIDTH))
}

pub struct Rasterizer<'a> {
  scheme: &'a ColorScheme,
}

impl<'a> Rasterizer<'a> {
  pub fn new(scheme: &'a ColorScheme) -> Self {
    Self { scheme }
  }

  /// Render `doc` into `pair`. The pair is expected to be clear.
  pub fn rasterize<D: DocumentSource + ?Sized>(
    &self,
    doc: &D,
    folds: &FoldMap,
    spans: &[HighlightSpan],
    pair: &mut RasterPair,
  ) -> Result<RasterStats> {
    validate_spans(spans, doc.len_chars())?;

    let mut stats = RasterStats::default();
    let line_count = doc.line_count();
    let mut segments = Segments::new(spans, folds);
    let mut segment = segments.next();
    let mut cursor = ORIGIN;
    let mut start = segment.as_ref().map_or(0, Segment::start);
    let mut line = 0;

    while line < line_count {
      let Some(current) = segment else {
        break;
      };
      let bounds = doc.line_bounds(line);

      if current.end() >= bounds.end {
        // the line ends first
        if folds.collapsed_at(start).is_none() {
          if let Segment::Text { span, .. } = current {
            let content_end = bounds.content_end();
            if start < content_end {
              let text = doc.slice(start..content_end);
              self.draw_token(&text, span, &mut cursor, pair, &mut stats);
            }
          }
          start = bounds.end;
          cursor = Point::new(ORIGIN.x, cursor.y + ROW_HEIGHT);
          stats.rows += 1;
        }
        line += 1;
        continue;
      }

      match current {
        Segment::Fold { region, .. } => {
          self.draw_placeholder(&region.placeholder, &mut cursor, pair, &mut stats);
        },
        Segment::Text { end, span, .. } => {
          let token_end = end.min(bounds.content_end());
          if start < token_end {
            let text = doc.slice(start..token_end);
            self.draw_token(&text, span, &mut cursor, pair, &mut stats);
          }
        },
      }

      segment = segments.next();
      start = segment.as_ref().map_or(current.end(), Segment::start);
    }

    // a fold running to the end of the document never meets a later line
    if let Some(Segment::Fold { region, .. }) = segment {
      self.draw_placeholder(&region.placeholder, &mut cursor, pair, &mut stats);
    }

    log::debug!(
      "rasterized {} rows, {} tokens, {} placeholders",
      stats.rows,
      stats.tokens,
      stats.placeholders
    );
    Ok(stats)
  }

  /// Band colour of a span. The error stripe wins over the effect colour,
  /// which wins over a background differing from the editor default.
  fn band_color(&self, span: &HighlightSpan) -> Option<Color> {
    span.error_stripe.or(span.effect).or(
      span
        .background
        .filter(|background| *background != self.scheme.background),
    )
  }

  fn draw_token(
    &self,
    text: &str,
    span: &HighlightSpan,
    cursor: &mut Point,
    pair: &mut RasterPair,
    stats: &mut RasterStats,
  ) {
    let token = expand_tabs(text);
    let width = token.chars().count();
    stats.tokens += 1;

    if let Some(color) = self.band_color(span) {
      let band = Rect::new(cursor.x, cursor.y, width as u32, 1);
      fill_rect(&mut pair.bg, band, color);
      stats.bands += 1;
    }

    // a lone dot is noise at this scale
    if !token.trim().is_empty() && token != "." {
      let color = span.foreground.unwrap_or(self.scheme.foreground);
      stats.glyph_runs += draw_glyphs(&mut pair.fg, &token, *cursor, color);
    }

    cursor.x += width as i32;
  }

  fn draw_placeholder(
    &self,
    placeholder: &str,
    cursor: &mut Point,
    pair: &mut RasterPair,
    stats: &mut RasterStats,
  ) {
    let token = expand_tabs(placeholder);
    stats.placeholders += 1;
    stats.glyph_runs += draw_glyphs(&mut pair.fg, &token, *cursor, self.scheme.folded_text);
    cursor.x += token.chars().count() as i32;
  }
}

/// Fill one pixel per non-whitespace character on the glyph row above
/// `baseline`, merging neighbours into runs. Returns the number of runs.
fn draw_glyphs(pixmap: &mut tiny_skia::Pixmap, token: &str, baseline: Point, color: Color) -> usize {
  let y = baseline.y - 1;
  let mut runs = 0;
  let mut run_start: Option<i32> = None;
  let mut column = 0;

  for ch in token.chars().chain(std::iter::once(' ')) {
    let x = baseline.x + column;
    match (ch.is_whitespace(), run_start) {
      (false, None) => run_start = Some(x),
      (true, Some(start)) => {
        fill_rect(pixmap, Rect::new(start, y, (x - start) as u32, 1), color);
        runs += 1;
        run_start = None;
      },
      _ => {},
    }
    column += 1;
  }
  runs
}

#[cfg(test)]
mod tests {
  use ropey::Rope;

  use super::*;
  use crate::{
    graphics::Size,
    host::{
      HighlightSource,
      PlainHighlights,
    },
    memory::MemoryDocument,
  };

  fn scheme() -> ColorScheme {
    ColorScheme::default()
  }

  fn pair(width: u32, height: u32) -> RasterPair {
    RasterPair::new(Size::new(width, height)).unwrap()
  }

  fn alpha(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> u8 {
    pixmap.pixel(x, y).map_or(0, |px| px.alpha())
  }

  fn glyph_row(pixmap: &tiny_skia::Pixmap, line: u32) -> String {
    (0..pixmap.width())
      .map(|x| if alpha(pixmap, x, 2 * line + 1) > 0 { '#' } else { '.' })
      .collect()
  }

  fn rasterize(text: &str, folds: Vec<FoldRegion>, spans: Option<Vec<HighlightSpan>>) -> (RasterPair, RasterStats) {
    let doc = MemoryDocument::new(Rope::from(text));
    let folds = FoldMap::new(&doc, folds);
    let spans = spans.unwrap_or_else(|| PlainHighlights.spans(0..doc.len_chars()));
    let mut pair = pair(16, 16);
    let scheme = scheme();
    let stats = Rasterizer::new(&scheme)
      .rasterize(&doc, &folds, &spans, &mut pair)
      .unwrap();
    (pair, stats)
  }

  #[test]
  fn empty_document_is_blank() {
    let (pair, stats) = rasterize("", Vec::new(), None);
    assert!(pair.is_blank());
    assert_eq!(stats.tokens, 0);
  }

  #[test]
  fn glyphs_land_on_line_rows() {
    let (pair, stats) = rasterize("ab c\n  d\n", Vec::new(), None);
    assert_eq!(glyph_row(&pair.fg, 0), "##.#............");
    assert_eq!(glyph_row(&pair.fg, 1), "..#.............");
    assert_eq!(glyph_row(&pair.fg, 2), "................");
    // the empty line after the trailing newline counts too
    assert_eq!(stats.rows, 3);
    // padding rows stay empty
    assert!((0..16).all(|x| alpha(&pair.fg, x, 2) == 0));
  }

  #[test]
  fn tabs_expand_to_four_columns() {
    let (pair, _) = rasterize("\tx", Vec::new(), None);
    assert_eq!(glyph_row(&pair.fg, 0), "....#...........");
  }

  #[test]
  fn lone_dots_draw_no_glyphs() {
    let (pair, _) = rasterize(".\n.\n.", Vec::new(), None);
    assert!(pair.fg.pixels().iter().all(|px| px.alpha() == 0));
  }

  #[test]
  fn lone_dots_keep_their_background_band() {
    let text = ".\n.";
    let red = Color::rgb(255, 0, 0);
    let spans = vec![
      HighlightSpan {
        background: Some(red),
        ..HighlightSpan::plain(0..1)
      },
      HighlightSpan::plain(1..2),
      HighlightSpan {
        background: Some(red),
        ..HighlightSpan::plain(2..3)
      },
    ];
    let (pair, stats) = rasterize(text, Vec::new(), Some(spans));
    assert!(pair.fg.pixels().iter().all(|px| px.alpha() == 0));
    assert_eq!(stats.bands, 2);
    assert_eq!(alpha(&pair.bg, 0, 2), 255);
    assert_eq!(alpha(&pair.bg, 0, 4), 255);
  }

  #[test]
  fn default_background_draws_no_band() {
    let spans = vec![HighlightSpan {
      background: Some(scheme().background),
      ..HighlightSpan::plain(0..3)
    }];
    let (pair, stats) = rasterize("abc", Vec::new(), Some(spans));
    assert_eq!(stats.bands, 0);
    assert!(pair.bg.pixels().iter().all(|px| px.alpha() == 0));
  }

  #[test]
  fn band_priority() {
    let scheme = scheme();
    let rasterizer = Rasterizer::new(&scheme);
    let bg = Color::rgb(1, 1, 1);
    let effect = Color::rgb(2, 2, 2);
    let stripe = Color::rgb(3, 3, 3);
    let span = HighlightSpan {
      background: Some(bg),
      ..HighlightSpan::default()
    };
    assert_eq!(rasterizer.band_color(&span), Some(bg));
    let span = HighlightSpan {
      effect: Some(effect),
      ..span
    };
    assert_eq!(rasterizer.band_color(&span), Some(effect));
    let span = HighlightSpan {
      error_stripe: Some(stripe),
      ..span
    };
    assert_eq!(rasterizer.band_color(&span), Some(stripe));
  }

  #[test]
  fn spans_split_tokens_within_a_line() {
    let spans = vec![
      HighlightSpan {
        foreground: Some(Color::rgb(255, 0, 0)),
        ..HighlightSpan::plain(0..2)
      },
      HighlightSpan::plain(2..5),
    ];
    let (pair, stats) = rasterize("ab cd", Vec::new(), Some(spans));
    assert_eq!(stats.tokens, 2);
    assert_eq!(glyph_row(&pair.fg, 0), "##.##...........");
    assert_eq!(pair.fg.pixel(0, 1).unwrap().red(), 255);
    assert_eq!(pair.fg.pixel(3, 1).unwrap().red(), 0);
  }

  #[test]
  fn multi_line_span_is_flushed_per_line() {
    // one span covering a block comment over three lines
    let (pair, stats) = rasterize("/*\n a\n*/", Vec::new(), None);
    assert_eq!(glyph_row(&pair.fg, 0), "##..............");
    assert_eq!(glyph_row(&pair.fg, 1), ".#..............");
    assert_eq!(glyph_row(&pair.fg, 2), "##..............");
    assert_eq!(stats.tokens, 3);
  }

  #[test]
  fn collapsed_fold_draws_placeholder_once() {
    // lines: "a {" / "  x" / "  y" / "} b" / "c"
    let text = "a {\n  x\n  y\n} b\nc";
    let fold = FoldRegion::collapsed(2, 13, "{.}");
    let (pair, stats) = rasterize(text, vec![fold], None);
    assert_eq!(stats.placeholders, 1);
    // "a " then "{.}" then " b"
    assert_eq!(glyph_row(&pair.fg, 0), "#.###.#.........");
    // the line after the fold takes the next row
    assert_eq!(glyph_row(&pair.fg, 1), "#...............");
    assert_eq!(glyph_row(&pair.fg, 2), "................");
  }

  #[test]
  fn fold_reaching_end_of_document_still_shows_placeholder() {
    let text = "x {\n  y\n}";
    let fold = FoldRegion::collapsed(2, 9, "{.}");
    let (pair, stats) = rasterize(text, vec![fold], None);
    assert_eq!(stats.placeholders, 1);
    assert_eq!(glyph_row(&pair.fg, 0), "#.###...........");
  }

  #[test]
  fn expanded_fold_renders_every_line() {
    let text = "a {\n  x\n}";
    let fold = FoldRegion {
      start:       2,
      end:         9,
      expanded:    true,
      placeholder: "{.}".into(),
    };
    let (pair, stats) = rasterize(text, vec![fold], None);
    assert_eq!(stats.placeholders, 0);
    assert_eq!(glyph_row(&pair.fg, 1), "..#.............");
    assert_eq!(glyph_row(&pair.fg, 2), "#...............");
  }

  #[test]
  fn gaps_in_spans_are_host_errors() {
    let doc = MemoryDocument::new(Rope::from("abcdef"));
    let spans = vec![HighlightSpan::plain(0..2), HighlightSpan::plain(3..6)];
    let mut pair = pair(8, 8);
    let scheme = scheme();
    let err = Rasterizer::new(&scheme)
      .rasterize(&doc, &FoldMap::identity(), &spans, &mut pair)
      .unwrap_err();
    assert!(matches!(err, OutlineError::HostState(_)));
  }

  #[test]
  fn spans_past_the_end_are_host_errors() {
    assert!(validate_spans(&[HighlightSpan::plain(0..9)], 4).is_err());
    assert!(validate_spans(&[HighlightSpan::plain(0..4)], 4).is_ok());
    assert!(validate_spans(&[], 4).is_ok());
  }
}
