// libmfc1k/src/cancellation.rs

//! Operator interrupt flag shared between threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Inter-thread stop flag. Clone it to hand it to a signal handler or an
/// input thread; every clone observes the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    canceled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Fresh, not canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the token to canceled. Idempotent.
    #[inline]
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// True once any clone was canceled.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// `Err(Interrupted)` once canceled, for use with `?` inside loops.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_canceled() {
            Err(crate::Error::Interrupted)
        } else {
            Ok(())
        }
    }
}
