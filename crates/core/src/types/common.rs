//! Common types and utilities shared across domain models

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns true if the instance is valid
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Formats a playback time in seconds as `MM:SS`
///
/// Minutes are not wrapped into hours, so a 75 minute position renders as
/// `75:00`. Negative or non-finite input renders as `00:00`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }

    let whole = seconds.trunc() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}
