//! Cooperative cancellation shared between a caller and a running operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{ExprError, ExprResult};

/// A cloneable cancellation flag.
///
/// The caller keeps one clone and calls [`Cancellation::cancel`] (typically
/// from a deadline timer); long-running operations poll
/// [`Cancellation::check`] at their checkpoints and abort with
/// [`ExprError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Return `Err(Cancelled)` if cancellation was requested.
    pub fn check(&self, operation: &str) -> ExprResult<()> {
        if self.is_cancelled() {
            return Err(ExprError::Cancelled {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}
