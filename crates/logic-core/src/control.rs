//! Run control state shared between a session and its driver task.
//!
//! Cancellation is a generation counter. Every run captures the generation
//! it was started with in a [`RunToken`]; starting another run or
//! cancelling bumps the counter, which makes every older token stale. The
//! driver checks its token before each step and before emitting, so once a
//! cancel took effect no newly computed step of the superseded run is
//! delivered. A snapshot whose delivery had already begun when another
//! thread cancelled still reaches every observer and the event stream.
//!
//! All fields are atomics: the driver's hot path and observer callbacks
//! never take a lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Proof of which generation a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken {
    generation: u64,
}

impl RunToken {
    /// The generation this token was issued for.
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Shared control state for one session.
#[derive(Debug)]
pub struct RunControl {
    /// Bumped on every start and every cancel.
    generation: AtomicU64,

    /// Delay after each non-terminal snapshot (runtime-adjustable).
    step_delay_ms: AtomicU64,
}

impl RunControl {
    /// Create control state with the given pacing.
    pub const fn new(step_delay_ms: u64) -> Self {
        Self {
            generation: AtomicU64::new(0),
            step_delay_ms: AtomicU64::new(step_delay_ms),
        }
    }

    // -----------------------------------------------------------------------
    // Generations
    // -----------------------------------------------------------------------

    /// Invalidate every outstanding token and issue a fresh one.
    pub fn begin_run(&self) -> RunToken {
        let previous = self.generation.fetch_add(1, Ordering::AcqRel);
        RunToken {
            generation: previous.wrapping_add(1),
        }
    }

    /// Invalidate every outstanding token.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Whether `token` still belongs to the current generation.
    pub fn is_live(&self, token: RunToken) -> bool {
        self.generation.load(Ordering::Acquire) == token.generation
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Pacing
    // -----------------------------------------------------------------------

    /// Current delay after each snapshot, in milliseconds.
    pub fn step_delay_ms(&self) -> u64 {
        self.step_delay_ms.load(Ordering::Acquire)
    }

    /// Change the delay; takes effect after the next snapshot. Returns the
    /// previous value.
    pub fn set_step_delay_ms(&self, ms: u64) -> u64 {
        self.step_delay_ms.swap(ms, Ordering::AcqRel)
    }
}

/// Cloneable handle that cancels whatever run is active in a session.
///
/// Safe to call from observer callbacks running on the driver task.
#[derive(Debug, Clone)]
pub struct Canceller {
    control: Arc<RunControl>,
}

impl Canceller {
    /// Wrap shared control state.
    pub const fn new(control: Arc<RunControl>) -> Self {
        Self { control }
    }

    /// Cancel the active run, if any.
    ///
    /// Called from another thread, this can race a snapshot that is
    /// already being delivered; that snapshot completes and nothing after
    /// it is emitted.
    pub fn cancel(&self) {
        self.control.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_live() {
        let control = RunControl::new(0);
        let token = control.begin_run();
        assert!(control.is_live(token));
        assert_eq!(token.generation(), control.generation());
    }

    #[test]
    fn newer_run_supersedes_older() {
        let control = RunControl::new(0);
        let first = control.begin_run();
        let second = control.begin_run();
        assert!(!control.is_live(first));
        assert!(control.is_live(second));
    }

    #[test]
    fn cancel_invalidates_current_token() {
        let control = Arc::new(RunControl::new(0));
        let token = control.begin_run();
        Canceller::new(Arc::clone(&control)).cancel();
        assert!(!control.is_live(token));
    }

    #[test]
    fn step_delay_is_adjustable() {
        let control = RunControl::new(150);
        assert_eq!(control.step_delay_ms(), 150);
        assert_eq!(control.set_step_delay_ms(0), 150);
        assert_eq!(control.step_delay_ms(), 0);
    }
}
