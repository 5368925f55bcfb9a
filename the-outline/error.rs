use thiserror::Error;

/// Errors that can occur while building or painting the outline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
  /// Pre-layout state: no drawing surface or a zero-sized panel. Callers treat
  /// this as "nothing to draw yet", never as a fault.
  #[error("Outline surface not ready")]
  NotReady,

  /// A layer pixmap could not be allocated
  #[error("Failed to allocate {width}x{height} outline layer")]
  Allocation { width: u32, height: u32 },

  /// A host collaborator returned data the outline cannot make sense of
  #[error("Inconsistent host state: {0}")]
  HostState(String),

  /// Invalid configuration value
  #[error("Outline configuration error: {0}")]
  Config(String),
}

impl OutlineError {
  /// Whether this error is the silent pre-layout condition.
  pub fn is_not_ready(&self) -> bool {
    matches!(self, Self::NotReady)
  }
}

pub type Result<T> = std::result::Result<T, OutlineError>;
