//! Pointer handling on the miniature: click to scroll, and preview scroll.
//!
//! A preview scroll temporarily scrolls the host to the point under the
//! pointer and slides back when the preview button is released. Only one
//! saved position is kept; starting a new preview replaces it.

use crate::{
  fold::FoldMap,
  graphics::{
    LogicalPosition,
    Point,
    Rect,
  },
  host::ScrollModel,
  viewport::miniature_to_host,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
  /// Click or drag to scroll.
  Primary,
  /// Hold to preview another part of the document.
  Preview,
  /// Opens the host's context menu.
  Context,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
  pub ctrl:  bool,
  pub shift: bool,
  pub alt:   bool,
}

/// Pointer input in panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
  Pressed {
    button:    PointerButton,
    position:  Point,
    modifiers: Modifiers,
  },
  Released {
    button:   PointerButton,
    position: Point,
  },
  Dragged {
    button:   PointerButton,
    position: Point,
  },
  Moved {
    position: Point,
  },
  Exited,
  /// Wheel notches; positive scrolls down.
  Wheel {
    rotation: f64,
  },
}

impl PointerEvent {
  pub fn position(&self) -> Option<Point> {
    match *self {
      Self::Pressed { position, .. }
      | Self::Released { position, .. }
      | Self::Dragged { position, .. }
      | Self::Moved { position } => Some(position),
      Self::Exited | Self::Wheel { .. } => None,
    }
  }
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
  Ignored,
  /// The host was asked to scroll.
  Scrolled,
  /// The host should open its context menu at this panel point.
  ContextMenu(Point),
}

/// Where the miniature currently is, for mapping pointer positions.
#[derive(Debug, Clone, Copy)]
pub struct PointerContext<'a> {
  pub y_offset: i32,
  pub folds:    &'a FoldMap,
  /// The user's animated scrolling preference.
  pub animated: bool,
}

#[derive(Debug, Default, Clone)]
pub struct PreviewScroll {
  /// Host scroll offset from before the preview started.
  saved:             Option<Point>,
  slide_back:        bool,
  /// Viewport rectangle last painted outside a preview.
  previous_viewport: Option<Rect>,
}

impl PreviewScroll {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_previewing(&self) -> bool {
    self.saved.is_some()
  }

  pub fn saved_offset(&self) -> Option<Point> {
    self.saved
  }

  /// The pre-preview viewport to draw as a ghost, while a preview is active.
  pub fn ghost(&self) -> Option<Rect> {
    self.previous_viewport.filter(|_| self.is_previewing())
  }

  /// Record the viewport just painted. Outside a preview it becomes the ghost
  /// shown by the next preview.
  pub fn track_viewport(&mut self, viewport: Rect) {
    if !self.is_previewing() {
      self.previous_viewport = Some(viewport);
    }
  }

  /// Apply a pointer event to the host's scroll state.
  pub fn handle<S: ScrollModel + ?Sized>(
    &mut self,
    event: PointerEvent,
    scroll: &mut S,
    cx: &PointerContext<'_>,
  ) -> PointerOutcome {
    match event {
      PointerEvent::Pressed {
        button: PointerButton::Primary,
        position,
        ..
      } => {
        // a primary click during a preview ends it where it is
        self.saved = None;
        scroll.scroll_to(target(position, cx), cx.animated);
        PointerOutcome::Scrolled
      },
      PointerEvent::Pressed {
        button: PointerButton::Preview,
        position,
        modifiers,
      } => {
        self.saved = Some(scroll.scroll_offset());
        // ctrl jumps back and forth without sliding
        self.slide_back = !modifiers.ctrl;
        scroll.scroll_to(target(position, cx), self.slide_back && cx.animated);
        PointerOutcome::Scrolled
      },
      PointerEvent::Pressed {
        button: PointerButton::Context,
        position,
        ..
      } => PointerOutcome::ContextMenu(position),
      PointerEvent::Released {
        button: PointerButton::Primary,
        ..
      } => {
        self.saved = None;
        PointerOutcome::Ignored
      },
      PointerEvent::Released {
        button: PointerButton::Preview,
        ..
      } => {
        self.previous_viewport = None;
        match self.saved.take() {
          Some(offset) => {
            scroll.scroll_to_offset(offset, self.slide_back && cx.animated);
            PointerOutcome::Scrolled
          },
          None => PointerOutcome::Ignored,
        }
      },
      PointerEvent::Dragged {
        button: PointerButton::Primary | PointerButton::Preview,
        position,
      } => {
        scroll.scroll_to(target(position, cx), false);
        PointerOutcome::Scrolled
      },
      PointerEvent::Wheel { rotation } => {
        // one visible page per notch, never animated
        let offset = scroll.scroll_offset();
        let page = scroll.visible_area().height as f64;
        let y = (offset.y as f64 + rotation * page) as i32;
        scroll.scroll_to_offset(Point::new(offset.x, y), false);
        PointerOutcome::Scrolled
      },
      _ => PointerOutcome::Ignored,
    }
  }
}

fn target(position: Point, cx: &PointerContext<'_>) -> LogicalPosition {
  miniature_to_host(position, cx.y_offset, cx.folds)
}
