//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Slowest and fastest speeds the player accepts
pub const SPEED_RANGE: (f32, f32) = (0.5, 3.0);

/// Longest pause that can be inserted between segments, in seconds
pub const MAX_PAUSE_SECS: f32 = 30.0;

/// Player preferences applied when a playback session starts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Speed multiplier a new session starts with
    pub default_speed: f32,

    /// Pause inserted between segments when a session starts (0 = continuous)
    pub default_pause_secs: f32,

    /// How often progress updates are emitted, in milliseconds
    pub progress_refresh_ms: u64,

    /// Speeds offered by the speed picker
    pub speed_presets: Vec<f32>,

    /// Pause durations offered by the pause picker
    pub pause_presets: Vec<f32>,

    /// Start playing as soon as a track is opened
    pub autoplay: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            default_pause_secs: 0.0,
            progress_refresh_ms: 100,
            speed_presets: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0],
            pause_presets: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            autoplay: true,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(
                self.default_speed,
                SPEED_RANGE.0,
                SPEED_RANGE.1,
                "player.default_speed",
            ),
            Validator::in_range(
                self.default_pause_secs,
                0.0,
                MAX_PAUSE_SECS,
                "player.default_pause_secs",
            ),
            Validator::in_range(self.progress_refresh_ms, 16, 1000, "player.progress_refresh_ms"),
        ];

        results.extend(Validator::each_in_range(
            &self.speed_presets,
            SPEED_RANGE.0,
            SPEED_RANGE.1,
            "player.speed_presets",
        ));
        results.extend(Validator::each_in_range(
            &self.pause_presets,
            0.0,
            MAX_PAUSE_SECS,
            "player.pause_presets",
        ));

        Validator::collect_errors(results)
    }
}
