//! Error types and recovery strategies for Lectern
//!
//! This module classifies errors into three severity tiers:
//! - **Recoverable**: The caller can simply try again with different input
//! - **Degraded**: The catalog or a file is unavailable but the app continues
//! - **Fatal**: The playback session cannot continue and must be torn down
//!
//! Playback errors are never retried automatically. Each error carries a
//! recovery action describing what the UI layer should do instead.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Ignore the request and keep the current state
    KeepCurrentState,
    /// Disable the failing feature and continue (e.g. skip a broken catalog)
    DisableFeature,
    /// Tear down the playback session
    EndSession,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepCurrentState => write!(f, "Keeping current state"),
            Self::DisableFeature => write!(f, "Disabling feature"),
            Self::EndSession => write!(f, "Ending playback session"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from by the caller
    Recoverable,
    /// Feature degraded but app can continue
    Degraded,
    /// The playback session cannot continue
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for Lectern
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Catalog Errors =====
    /// Catalog input could not be decoded (syntax, missing field, wrong type)
    #[error("Catalog decode error: {message}")]
    CatalogDecode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A segment entry is not a `[start, end]` pair
    #[error("Invalid segment {index} in '{track}': {reason}")]
    InvalidSegment {
        track: String,
        index: usize,
        reason: String,
    },

    /// A track breaks the segment layout invariants
    #[error("Invalid track '{}': {}", .title, .reasons.join("; "))]
    InvalidTrack { title: String, reasons: Vec<String> },

    /// Requested track index does not exist
    #[error("Track {index} not found (catalog has {available} tracks)")]
    TrackNotFound { index: usize, available: usize },

    // ===== Audio/Transport Errors =====
    /// The transport could not open the track's audio
    #[error("Audio unavailable: {audio_ref} - {reason}")]
    AudioUnavailable { audio_ref: String, reason: String },

    /// The transport failed during playback
    #[error("Playback device error: {message}")]
    PlaybackDeviceError { message: String },

    // ===== File System Errors =====
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Permission denied for file operation
    #[error("Permission denied: {operation} on {path}")]
    PermissionDenied { operation: String, path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TrackNotFound { .. } => ErrorSeverity::Recoverable,

            Self::AudioUnavailable { .. } | Self::PlaybackDeviceError { .. } => {
                ErrorSeverity::Fatal
            }

            // Context-dependent - default to degraded
            _ => ErrorSeverity::Degraded,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::TrackNotFound { .. } => RecoveryAction::KeepCurrentState,

            Self::CatalogDecode { .. }
            | Self::InvalidSegment { .. }
            | Self::InvalidTrack { .. } => RecoveryAction::DisableFeature,

            Self::AudioUnavailable { .. } | Self::PlaybackDeviceError { .. } => {
                RecoveryAction::EndSession
            }

            // Default to user intervention for safety
            _ => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::CatalogDecode { .. } => {
                "The audiobook list could not be read. It may be damaged.".to_string()
            }
            Self::InvalidSegment { track, .. } | Self::InvalidTrack { title: track, .. } => {
                format!("\"{}\" has invalid segment information.", track)
            }
            Self::TrackNotFound { .. } => "The requested audiobook was not found.".to_string(),

            Self::AudioUnavailable { .. } => {
                "Cannot play this audiobook. The audio file is missing or unreadable.".to_string()
            }
            Self::PlaybackDeviceError { .. } => {
                "Playback stopped unexpectedly. Please open the audiobook again.".to_string()
            }

            Self::FileNotFound { .. } => {
                "The file was not found. It may have been moved or deleted.".to_string()
            }
            Self::PermissionDenied { .. } => {
                "Permission denied. Please grant storage access in Settings.".to_string()
            }
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),
        }
    }

    /// Returns true if this error ends the playback session
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Helper to create a catalog decode error from any error type
    pub fn catalog_decode<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::CatalogDecode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to convert an I/O error while keeping the affected path
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                operation: "read".to_string(),
                path: path.to_path_buf(),
            },
            _ => Self::IoError {
                message: format!("{}: {}", path.display(), err),
                source: err,
            },
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::from_io(Path::new("unknown"), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_recovery_action_display() {
        assert_eq!(
            RecoveryAction::KeepCurrentState.to_string(),
            "Keeping current state"
        );
        assert_eq!(RecoveryAction::EndSession.to_string(), "Ending playback session");
        assert_eq!(
            RecoveryAction::UserIntervention.to_string(),
            "User intervention required"
        );
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_catalog_errors_disable_feature() {
        let err = AppError::InvalidSegment {
            track: "Book".to_string(),
            index: 2,
            reason: "expected 2 components, found 3".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Degraded);
        assert_eq!(err.recovery_action(), RecoveryAction::DisableFeature);
        assert!(!err.is_critical());
        assert_eq!(
            err.to_string(),
            "Invalid segment 2 in 'Book': expected 2 components, found 3"
        );
    }

    #[test]
    fn test_transport_errors_end_session() {
        let err = AppError::AudioUnavailable {
            audio_ref: "missing.mp3".to_string(),
            reason: "no such file".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.recovery_action(), RecoveryAction::EndSession);
        assert!(err.is_critical());

        let stalled = AppError::PlaybackDeviceError {
            message: "decoder stalled".to_string(),
        };
        assert!(stalled.is_critical());
        assert_eq!(stalled.recovery_action(), RecoveryAction::EndSession);
    }

    #[test]
    fn test_invalid_track_joins_reasons() {
        let err = AppError::InvalidTrack {
            title: "Book".to_string(),
            reasons: vec!["one".to_string(), "two".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid track 'Book': one; two");
        assert!(err.user_message().contains("Book"));
    }

    #[test]
    fn test_user_messages_are_friendly() {
        let err = AppError::PlaybackDeviceError {
            message: "AVPlayerItem failed: -11800".to_string(),
        };
        let msg = err.user_message();
        assert!(!msg.contains("-11800"));
    }

    #[test]
    fn test_from_io_error_not_found() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = AppError::from_io(Path::new("/tmp/catalog.json"), io_err);
        match err {
            AppError::FileNotFound { path } => assert_eq!(path, PathBuf::from("/tmp/catalog.json")),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_from_io_error_other() {
        let io_err = io::Error::new(io::ErrorKind::Other, "boom");
        let err: AppError = io_err.into();
        assert!(matches!(err, AppError::IoError { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_catalog_decode_helper_keeps_source() {
        let json_err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err = AppError::catalog_decode("invalid catalog JSON", json_err);
        assert!(err.source().is_some());
        assert_eq!(err.recovery_action(), RecoveryAction::DisableFeature);
    }

    #[test]
    fn test_result_type_alias() {
        fn check() -> Result<u8> {
            Err(AppError::TrackNotFound {
                index: 1,
                available: 0,
            })
        }
        assert!(check().is_err());
    }
}
