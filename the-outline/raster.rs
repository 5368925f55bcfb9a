//! The cached miniature: a background-band layer and a glyph layer of
//! identical size.
//!
//! The layers only ever grow. A request for a smaller visible size keeps the
//! existing, larger allocation and clears it. Rasterization renders into a back
//! pair and swaps it in once the pass completes, so a failed pass leaves the
//! previous miniature intact.

use tiny_skia::Pixmap;

use crate::{
  error::{
    OutlineError,
    Result,
  },
  graphics::Size,
};

/// The two layers of one miniature.
#[derive(Clone)]
pub struct RasterPair {
  /// Glyph layer.
  pub fg: Pixmap,
  /// Background colour bands.
  pub bg: Pixmap,
}

impl RasterPair {
  pub fn new(size: Size) -> Result<Self> {
    let alloc = || {
      Pixmap::new(size.width, size.height).ok_or(OutlineError::Allocation {
        width:  size.width,
        height: size.height,
      })
    };
    Ok(Self {
      fg: alloc()?,
      bg: alloc()?,
    })
  }

  pub fn size(&self) -> Size {
    Size::new(self.fg.width(), self.fg.height())
  }

  pub fn clear(&mut self) {
    self.fg.fill(tiny_skia::Color::TRANSPARENT);
    self.bg.fill(tiny_skia::Color::TRANSPARENT);
  }

  /// Whether every pixel of both layers is fully transparent.
  pub fn is_blank(&self) -> bool {
    self.fg.pixels().iter().all(|px| px.alpha() == 0)
      && self.bg.pixels().iter().all(|px| px.alpha() == 0)
  }
}

pub struct RasterCache {
  front:        Option<RasterPair>,
  back:         Option<RasterPair>,
  visible_size: Size,
  dirty:        bool,
  allocations:  u64,
  releases:     u64,
  /// Bumped every time a completed pass is swapped in.
  generation:   u64,
}

impl Default for RasterCache {
  fn default() -> Self {
    Self::new()
  }
}

impl RasterCache {
  pub fn new() -> Self {
    Self {
      front:        None,
      back:         None,
      visible_size: Size::default(),
      dirty:        true,
      allocations:  0,
      releases:     0,
      generation:   0,
    }
  }

  /// Make sure the layers are at least `size`. Returns `true` when they had to
  /// be reallocated.
  ///
  /// A zero-sized request is the pre-layout state and does nothing.
  pub fn ensure_size(&mut self, size: Size) -> Result<bool> {
    if size.is_empty() {
      return Ok(false);
    }

    let size_changed = self.visible_size != size;
    self.visible_size = size;

    let fits = self
      .front
      .as_ref()
      .is_some_and(|pair| pair.size().contains(size));
    if fits {
      if size_changed {
        self.dirty = true;
      }
      return Ok(false);
    }

    self.release();
    self.front = Some(RasterPair::new(size)?);
    self.back = Some(RasterPair::new(size)?);
    self.allocations += 1;
    self.dirty = true;
    log::debug!("allocated {}x{} outline layers", size.width, size.height);
    Ok(true)
  }

  /// Mark the miniature stale. The next paint re-rasterizes the whole
  /// document.
  pub fn invalidate(&mut self) {
    self.dirty = true;
  }

  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  /// Free both layers. Safe to call repeatedly.
  pub fn release(&mut self) {
    let had_layers = self.front.take().is_some() | self.back.take().is_some();
    if had_layers {
      self.releases += 1;
    }
    self.dirty = true;
  }

  pub fn is_allocated(&self) -> bool {
    self.front.is_some()
  }

  /// Number of times layers were (re)allocated.
  pub fn allocations(&self) -> u64 {
    self.allocations
  }

  /// Number of times an allocation was freed.
  pub fn releases(&self) -> u64 {
    self.releases
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn visible_size(&self) -> Size {
    self.visible_size
  }

  /// Size of the underlying allocation, which may exceed the visible size.
  pub fn allocated_size(&self) -> Option<Size> {
    self.front.as_ref().map(RasterPair::size)
  }

  /// The last completed miniature.
  pub fn layers(&self) -> Option<&RasterPair> {
    self.front.as_ref()
  }

  /// Clear the back pair, let `render` fill it and swap it in on success.
  ///
  /// On error the front pair is untouched and the cache stays dirty so the
  /// next trigger retries.
  pub fn rasterize_with<T>(&mut self, render: impl FnOnce(&mut RasterPair) -> Result<T>) -> Result<T> {
    let Some(back) = self.back.as_mut() else {
      return Err(OutlineError::NotReady);
    };
    back.clear();
    let out = render(back)?;
    std::mem::swap(&mut self.front, &mut self.back);
    self.dirty = false;
    self.generation += 1;
    Ok(out)
  }
}
