use lectern_core::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid speed: {0}")]
    InvalidSpeed(f32),

    #[error("Invalid pause duration: {0}s")]
    InvalidPauseDuration(f64),

    #[error("Invalid seek fraction: {0}")]
    InvalidSeek(f64),

    #[error("Platform error: {0}")]
    Platform(#[from] AppError),
}

impl EngineError {
    /// Returns a message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidSpeed(_) => "That playback speed is not supported.".to_string(),
            Self::InvalidPauseDuration(_) => "That pause length is not supported.".to_string(),
            Self::InvalidSeek(_) => "Cannot seek to that position in the audio.".to_string(),
            Self::Platform(err) => err.user_message(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
