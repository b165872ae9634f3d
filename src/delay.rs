//! Cancellable "thinking" pause shown before a computed move is played
//!
//! The pause has no effect on which move is chosen. It runs after the
//! search, polls a [`CancelToken`], and reports whether it ran to the end
//! so the caller can drop the move if the game moved on meanwhile.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SearchConfig;

/// Polling interval while waiting
const SLICE: Duration = Duration::from_millis(10);

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    Elapsed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkingDelay {
    duration: Duration,
}

impl ThinkingDelay {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(Duration::from_millis(config.thinking_delay_ms))
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Block for the configured duration or until `token` is cancelled.
    pub fn wait(&self, token: &CancelToken) -> DelayOutcome {
        let end = Instant::now() + self.duration;
        loop {
            if token.is_cancelled() {
                return DelayOutcome::Cancelled;
            }
            let now = Instant::now();
            if now >= end {
                return DelayOutcome::Elapsed;
            }
            thread::sleep(SLICE.min(end - now));
        }
    }
}
