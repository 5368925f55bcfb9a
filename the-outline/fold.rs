//! Mapping between unfolded line numbers (every source line) and folded line
//! numbers (rows actually shown once collapsed regions are accounted for).
//!
//! A collapsed region spanning `start_line..end_line` shows as a single row:
//! the start line, the placeholder and the tail of the end line. The lines
//! after the start line up to and including the end line take no row of their
//! own.

use crate::host::DocumentSource;

/// A host fold region, in char offsets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FoldRegion {
  pub start:       usize,
  pub end:         usize,
  pub expanded:    bool,
  pub placeholder: String,
}

impl FoldRegion {
  pub fn collapsed(start: usize, end: usize, placeholder: impl Into<String>) -> Self {
    Self {
      start,
      end,
      expanded: false,
      placeholder: placeholder.into(),
    }
  }

  pub fn is_collapsed(&self) -> bool {
    !self.expanded
  }

  pub fn contains(&self, offset: usize) -> bool {
    self.start <= offset && offset < self.end
  }
}

/// A fold region resolved to unfolded line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldLines {
  pub start_line: usize,
  pub end_line:   usize,
  pub expanded:   bool,
}

impl FoldLines {
  pub const fn collapsed(start_line: usize, end_line: usize) -> Self {
    Self {
      start_line,
      end_line,
      expanded: false,
    }
  }

  pub const fn expanded(start_line: usize, end_line: usize) -> Self {
    Self {
      start_line,
      end_line,
      expanded: true,
    }
  }

  /// Number of rows the region removes when collapsed.
  pub const fn hidden_lines(&self) -> usize {
    self.end_line.saturating_sub(self.start_line)
  }
}

/// Folded row of `unfolded_line`, given regions ordered by start line.
///
/// A line strictly inside a collapsed region maps onto the region's row. The
/// region's own start line is not inside it.
pub fn folded_line_of(unfolded_line: usize, regions: &[FoldLines]) -> usize {
  let mut line = unfolded_line;
  for region in regions {
    if region.start_line >= unfolded_line {
      break;
    }
    if region.expanded {
      continue;
    }
    if region.end_line <= unfolded_line {
      line -= region.hidden_lines();
    } else {
      line -= unfolded_line - region.start_line;
      break;
    }
  }
  line
}

/// Unfolded line shown at `folded_line`, given regions ordered by start line.
///
/// For the row of a collapsed region this is the region's start line.
pub fn unfolded_line_of(folded_line: usize, regions: &[FoldLines]) -> usize {
  // folded and unfolded cursors, advanced together through visible lines
  let mut yf = 0;
  let mut yu = 0;
  for region in regions {
    let skip = region.start_line.saturating_sub(yu);
    if folded_line <= yf + skip {
      return yu + (folded_line - yf);
    }
    yf += skip;
    yu += skip;

    let span = region.hidden_lines();
    if !region.expanded {
      yu += span;
    } else if folded_line > yf + span {
      yf += span;
      yu += span;
    } else {
      return yu + (folded_line - yf);
    }
  }
  yu + (folded_line - yf)
}

/// Snapshot of the host folds for one rasterization or paint pass.
#[derive(Debug, Default, Clone)]
pub struct FoldMap {
  collapsed: Vec<FoldRegion>,
  lines:     Vec<FoldLines>,
}

impl FoldMap {
  /// Resolve `regions` against `doc`.
  ///
  /// Expanded regions map lines one to one in both directions, so only
  /// collapsed regions are kept. A collapsed region nested inside another
  /// collapsed region is already hidden and is dropped as well.
  pub fn new<D: DocumentSource + ?Sized>(doc: &D, mut regions: Vec<FoldRegion>) -> Self {
    regions.retain(FoldRegion::is_collapsed);
    regions.sort_by_key(|region| (region.start, std::cmp::Reverse(region.end)));

    let mut collapsed: Vec<FoldRegion> = Vec::with_capacity(regions.len());
    let mut lines = Vec::with_capacity(regions.len());
    for region in regions {
      if region.end <= region.start {
        continue;
      }
      if collapsed.last().is_some_and(|outer| region.start < outer.end) {
        continue;
      }
      let start_line = doc.line_of_offset(region.start);
      let end_line = doc.line_of_offset(region.end).max(start_line);
      lines.push(FoldLines::collapsed(start_line, end_line));
      collapsed.push(region);
    }

    Self { collapsed, lines }
  }

  /// A map with no collapsed regions.
  pub fn identity() -> Self {
    Self::default()
  }

  pub fn lines(&self) -> &[FoldLines] {
    &self.lines
  }

  pub fn collapsed_regions(&self) -> &[FoldRegion] {
    &self.collapsed
  }

  pub fn folded_line_of(&self, unfolded_line: usize) -> usize {
    folded_line_of(unfolded_line, &self.lines)
  }

  pub fn unfolded_line_of(&self, folded_line: usize) -> usize {
    unfolded_line_of(folded_line, &self.lines)
  }

  /// Rows needed for a document of `line_count` lines.
  pub fn folded_line_count(&self, line_count: usize) -> usize {
    let hidden: usize = self.lines.iter().map(FoldLines::hidden_lines).sum();
    line_count.saturating_sub(hidden)
  }

  /// The collapsed region covering `offset`, if any.
  pub fn collapsed_at(&self, offset: usize) -> Option<&FoldRegion> {
    let idx = self
      .collapsed
      .partition_point(|region| region.start <= offset);
    idx
      .checked_sub(1)
      .map(|idx| &self.collapsed[idx])
      .filter(|region| region.contains(offset))
  }

  /// First collapsed region starting at or after `offset`.
  pub fn next_collapsed_from(&self, offset: usize) -> Option<&FoldRegion> {
    let idx = self.collapsed.partition_point(|region| region.start < offset);
    self.collapsed.get(idx)
  }
}
