use crate::error::{EngineError, EngineResult};
use std::time::Duration;

/// Represents a playback speed multiplier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed {
    value: f32,
}

impl Speed {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;
    pub const DEFAULT: f32 = 1.0;

    /// Creates a new speed value, rejecting anything outside the supported range
    pub fn new(value: f32) -> EngineResult<Self> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(EngineError::InvalidSpeed(value));
        }
        Ok(Self { value })
    }

    /// Returns the numeric value
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Checks if this is normal speed
    pub fn is_normal(&self) -> bool {
        (self.value - Self::DEFAULT).abs() < f32::EPSILON
    }

    /// Wall-clock time needed to play `media_secs` of audio at this speed
    pub fn wall_time(&self, media_secs: f64) -> Duration {
        secs_to_duration(media_secs / f64::from(self.value))
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self {
            value: Self::DEFAULT,
        }
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}x", self.value)
    }
}

impl PartialOrd for Speed {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

/// Converts seconds to a `Duration`, mapping negative or NaN input to zero
pub(crate) fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
