//! Deferred work delivered back to the engine
//!
//! Timers and boundary observers never hold a reference to the engine.
//! They carry an [`EngineCallback`] value instead, and the host hands that
//! value to [`SegmentEngine::handle_callback`](crate::SegmentEngine::handle_callback)
//! on the engine's thread. Every callback is stamped with the session it was
//! armed for, so anything fired after teardown is recognised and dropped.

use serde::{Deserialize, Serialize};

/// Generation number of a playback session
///
/// Tokens only ever increase; a token is never reused once its session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(&self) -> u64 {
        self.0
    }

    /// Returns the token for the following session
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// What the engine should do when a callback fires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CallbackKind {
    /// The segment timer for `index` ran out
    SegmentFinished { index: usize },
    /// The silent gap after `index` is over
    PauseElapsed { index: usize },
    /// The playhead crossed the end of the repeated segment
    RepeatBoundary { index: usize },
    /// The remainder of a formerly repeated segment has played
    RepeatReleased { index: usize },
    /// Periodic progress refresh
    ProgressTick,
}

/// A callback value produced by a timer or boundary observer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineCallback {
    pub session: SessionToken,
    /// Arm sequence number for single-shot timers, zero otherwise
    pub ticket: u64,
    pub kind: CallbackKind,
}

impl EngineCallback {
    pub fn new(session: SessionToken, kind: CallbackKind) -> Self {
        Self {
            session,
            ticket: 0,
            kind,
        }
    }

    pub(crate) fn with_ticket(mut self, ticket: u64) -> Self {
        self.ticket = ticket;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generations_increase() {
        let first = SessionToken::new(1);
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.generation(), 2);
    }

    #[test]
    fn test_callback_ticket() {
        let cb = EngineCallback::new(SessionToken::new(3), CallbackKind::ProgressTick);
        assert_eq!(cb.ticket, 0);
        assert_eq!(cb.with_ticket(7).ticket, 7);
    }
}
