//! Domain types for Lectern
//!
//! This module contains the immutable audiobook model:
//! - `track`: Track, segment boundaries and illustrated sections
//! - `catalog`: Decoding a list of tracks from the catalog source
//! - `common`: Shared traits and time formatting

mod catalog;
mod common;
mod track;

// Re-export all public types
pub use catalog::Catalog;
pub use common::{format_clock, Validator};
pub use track::{IllustratedSection, Segment, Track};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let segment = Segment::new(0.0, 10.0);
        assert!(segment.is_valid());
        assert_eq!(format_clock(65.0), "01:05");
    }
}
