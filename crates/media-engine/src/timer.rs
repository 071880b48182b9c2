use crate::callback::EngineCallback;
use std::time::Duration;

/// Identifies a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Timer facility used by the engine
///
/// Implementations must deliver fired callbacks to the engine's thread, and
/// a cancelled handle must never fire afterwards. Cancelling an unknown or
/// already-fired handle is a no-op.
pub trait Scheduler {
    /// Fires `callback` once after `after` has elapsed
    fn schedule_once(&mut self, after: Duration, callback: EngineCallback) -> TimerHandle;

    /// Fires `callback` every `every` until cancelled
    fn schedule_repeating(&mut self, every: Duration, callback: EngineCallback) -> TimerHandle;

    fn cancel(&mut self, handle: TimerHandle);
}
