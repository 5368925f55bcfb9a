//! Surfacing unexpected faults to the user without flooding them.

use std::sync::atomic::{
  AtomicBool,
  AtomicUsize,
  Ordering,
};

use serde::Deserialize;

use crate::error::OutlineError;

/// How faults reach the user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultPolicy {
  /// Notify the first fault, log the rest.
  #[default]
  OncePerSession,
  /// Notify every fault.
  Always,
  /// Never notify, only log.
  LogOnly,
}

/// The host's user notification mechanism.
pub trait FaultSink: Send + Sync {
  fn notify(&self, message: &str);
}

/// Shared by every outline panel of one application session.
pub struct FaultReporter {
  policy:   FaultPolicy,
  sink:     Option<Box<dyn FaultSink>>,
  notified: AtomicBool,
  faults:   AtomicUsize,
}

impl FaultReporter {
  pub fn new(policy: FaultPolicy, sink: Option<Box<dyn FaultSink>>) -> Self {
    Self {
      policy,
      sink,
      notified: AtomicBool::new(false),
      faults: AtomicUsize::new(0),
    }
  }

  /// A reporter that only writes to the log.
  pub fn log_only() -> Self {
    Self::new(FaultPolicy::LogOnly, None)
  }

  pub fn policy(&self) -> FaultPolicy {
    self.policy
  }

  /// Faults reported so far, notified or not.
  pub fn fault_count(&self) -> usize {
    self.faults.load(Ordering::Relaxed)
  }

  /// Report `err`. Returns whether the user was notified.
  ///
  /// The pre-layout condition is not a fault and is ignored. Inconsistent host
  /// data abandons the current operation only and is logged as a warning.
  pub fn report(&self, err: &OutlineError) -> bool {
    match err {
      OutlineError::NotReady => return false,
      OutlineError::HostState(_) => {
        log::warn!("code outline skipped an update: {err}");
        return false;
      },
      _ => {},
    }

    self.faults.fetch_add(1, Ordering::Relaxed);
    let notify = match self.policy {
      FaultPolicy::Always => true,
      FaultPolicy::OncePerSession => !self.notified.swap(true, Ordering::AcqRel),
      FaultPolicy::LogOnly => false,
    };

    match (&self.sink, notify) {
      (Some(sink), true) => {
        log::error!("code outline fault: {err}");
        sink.notify(&format!("Code outline error: {err}"));
        true
      },
      _ => {
        log::debug!("code outline fault: {err}");
        false
      },
    }
  }
}
