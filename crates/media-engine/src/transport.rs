use crate::callback::EngineCallback;
use crate::error::EngineResult;

/// Identifies a registered boundary observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverHandle(u64);

impl ObserverHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Audio output the engine drives
///
/// Times are media seconds from the start of the loaded audio. The rate set
/// with [`set_rate`](Transport::set_rate) applies whenever the transport is
/// playing; setting it does not change the play/pause state.
pub trait Transport {
    /// Opens the audio for a new session, positioned at zero and paused
    fn load(&mut self, audio_ref: &str) -> EngineResult<()>;

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, seconds: f64);

    fn current_time(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn set_rate(&mut self, rate: f32);

    /// Delivers `callback` every time the playhead crosses `at` while playing
    fn add_boundary_observer(&mut self, at: f64, callback: EngineCallback) -> ObserverHandle;

    fn remove_boundary_observer(&mut self, handle: ObserverHandle);
}
