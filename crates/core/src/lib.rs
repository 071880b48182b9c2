pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{format_clock, Catalog, IllustratedSection, Segment, Track, Validator};
