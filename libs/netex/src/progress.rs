//! Cancellation and progress reporting.

use std::sync::atomic::{AtomicBool, Ordering};

/// Receives progress updates and signals cancellation.
///
/// Extraction polls [`Progress::is_cancelled`] at the start of every cell and
/// of every stage.
pub trait Progress {
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Reports the completed fraction, between 0 and 1.
    fn set_progress(&self, _fraction: f64) {}

    fn set_status(&self, _status: &str) {}
}

/// A [`Progress`] that is never cancelled and discards updates.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// A [`Progress`] cancelled through a shared flag.
#[derive(Debug, Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Progress for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn set_status(&self, status: &str) {
        tracing::trace!(status);
    }
}
