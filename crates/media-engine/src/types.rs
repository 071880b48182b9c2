use serde::{Deserialize, Serialize};

/// Current state of the engine's run intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Notifications pushed to UI listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    SessionStarted { title: String, segment_count: usize },
    SessionEnded,
    StatusChanged(PlaybackStatus),
    SegmentChanged { index: usize },
    RepeatChanged { enabled: bool, index: Option<usize> },
    RepeatLooped { index: usize },
    SpeedChanged { speed: f32 },
    PauseDurationChanged { seconds: f64 },
    Progress {
        current_secs: f64,
        duration_secs: u64,
        fraction: f64,
    },
    IllustrationChanged { image_ref: String },
    Error { message: String },
}

/// Snapshot of everything a player screen displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub book_name: String,
    pub author: String,
    pub cover_image_ref: String,
    pub transcript: String,
    pub current_time_label: String,
    pub duration_label: String,
    pub progress: f64,
    pub segment_index: usize,
    pub segment_count: usize,
    pub illustration: Option<String>,
    pub is_playing: bool,
    pub is_repeating: bool,
    pub speed: f32,
    pub pause_secs: f64,
}
