//! Cooperative cancellation and deadlines for long-running computations.
//!
//! The optimizer polls a [`StopToken`] once per solver iteration and the
//! simulators poll it between scenario blocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::AnalyticsError;

/// Why a computation was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// [`StopToken::cancel`] was called
    Cancelled,
    /// The deadline passed
    DeadlineExceeded,
}

impl StopReason {
    /// Short diagnostic string, used as the solver message.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline exceeded",
        }
    }
}

impl From<StopReason> for AnalyticsError {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::Cancelled => Self::Cancelled,
            StopReason::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Shared cancellation flag with an optional deadline.
///
/// Clones share the flag, so one clone can cancel work running on another
/// thread.
///
/// # Example
///
/// ```
/// use folio_analytics::control::{StopReason, StopToken};
///
/// let token = StopToken::new();
/// let worker = token.clone();
/// assert_eq!(worker.check(), None);
/// token.cancel();
/// assert_eq!(worker.check(), Some(StopReason::Cancelled));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl StopToken {
    /// Token that never stops on its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once `deadline` has passed.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop once `timeout` has elapsed from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Request cancellation for every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// True once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Reason to stop, if any. Cancellation wins over the deadline.
    #[must_use]
    pub fn check(&self) -> Option<StopReason> {
        if self.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(StopReason::DeadlineExceeded),
            _ => None,
        }
    }
}
