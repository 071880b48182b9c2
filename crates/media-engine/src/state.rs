//! Per-session playback state

use crate::callback::{CallbackKind, SessionToken};
use crate::error::{EngineError, EngineResult};
use crate::speed::{secs_to_duration, Speed};
use crate::timer::TimerHandle;
use crate::transport::ObserverHandle;
use lectern_core::{Segment, Track};
use std::sync::Arc;
use std::time::Duration;

/// Silence inserted after each segment, in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct PauseDuration(f64);

impl PauseDuration {
    pub const ZERO: Self = Self(0.0);

    pub fn new(secs: f64) -> EngineResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(EngineError::InvalidPauseDuration(secs));
        }
        Ok(Self(secs))
    }

    pub fn secs(&self) -> f64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        secs_to_duration(self.0)
    }

    pub fn mode(&self) -> PlaybackMode {
        if self.0 > 0.0 {
            PlaybackMode::Augmented { pause: *self }
        } else {
            PlaybackMode::Continuous
        }
    }
}

/// How segments are strung together
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackMode {
    /// The transport plays straight through segment boundaries
    Continuous,
    /// Each segment is played on its own timer, followed by `pause` of silence
    Augmented { pause: PauseDuration },
}

impl PlaybackMode {
    pub fn is_augmented(&self) -> bool {
        matches!(self, Self::Augmented { .. })
    }
}

/// A segment being looped by a boundary observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatLoop {
    pub index: usize,
    pub segment: Segment,
    pub observer: ObserverHandle,
}

/// The single outstanding single-shot timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTimer {
    pub handle: TimerHandle,
    pub ticket: u64,
    pub kind: CallbackKind,
}

/// Everything the engine knows about the track being played
#[derive(Debug)]
pub struct SessionState {
    pub track: Arc<Track>,
    pub token: SessionToken,
    pub is_playing: bool,
    pub pause: PauseDuration,
    pub speed: Speed,
    pub repeat: Option<RepeatLoop>,
    pub active_timer: Option<ActiveTimer>,
    pub progress_timer: Option<TimerHandle>,
    pub last_segment: usize,
    pub last_illustration: Option<usize>,
}

impl SessionState {
    pub fn new(track: Arc<Track>, token: SessionToken, speed: Speed, pause: PauseDuration) -> Self {
        Self {
            track,
            token,
            is_playing: false,
            pause,
            speed,
            repeat: None,
            active_timer: None,
            progress_timer: None,
            last_segment: 0,
            last_illustration: None,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.pause.mode()
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat.is_some()
    }

    /// Fraction of the track played, in `[0, 1]`
    pub fn progress_at(&self, position: f64) -> f64 {
        let duration = self.track.duration_secs() as f64;
        if duration <= 0.0 || !position.is_finite() {
            return 0.0;
        }
        (position / duration).clamp(0.0, 1.0)
    }

    /// Index into the track's sections of the illustration covering `position`
    pub fn illustration_at(&self, position: f64) -> Option<usize> {
        self.track
            .sections()
            .iter()
            .position(|section| section.contains(position))
    }
}
