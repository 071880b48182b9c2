//! Validation helpers for settings sections
//!
//! Sections implement [`ConfigSection`]. The [`Validator`] helpers produce
//! one [`ValidationError`] per offending field, and a file is reported in a
//! single pass.

pub use crate::error::ValidationError;

/// A block of settings that can check itself
pub trait ConfigSection: Default {
    /// Returns every validation failure in this section
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

/// Common validators for settings values
pub struct Validator;

impl Validator {
    /// Checks that a value lies in `[min, max]`
    ///
    /// NaN never compares in range and is rejected.
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        }
    }

    /// Checks every element of a list with [`Validator::in_range`]
    ///
    /// An empty list is an error of its own.
    pub fn each_in_range<T>(
        values: &[T],
        min: T,
        max: T,
        field: &str,
    ) -> Vec<Result<(), ValidationError>>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if values.is_empty() {
            return vec![Err(ValidationError::new(field, "must not be empty"))];
        }

        values
            .iter()
            .enumerate()
            .map(|(i, v)| Self::in_range(*v, min, max, &format!("{}[{}]", field, i)))
            .collect()
    }

    /// Checks that a string is not blank
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Collapses individual checks into a section result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
