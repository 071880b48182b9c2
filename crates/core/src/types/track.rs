//! Track, segment and illustration domain models

use crate::error::{AppError, Result};
use crate::types::Validator;
use serde::{Deserialize, Serialize};

/// A contiguous `(start, end)` range of the audio timeline, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    /// Creates a new segment
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Returns the segment length in seconds at normal speed
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Checks if a position falls within this segment (end exclusive)
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position < self.end
    }
}

impl Validator for Segment {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.start.is_finite() || !self.end.is_finite() {
            errors.push("Segment bounds must be finite".to_string());
        } else {
            if self.start < 0.0 {
                errors.push("Segment start cannot be negative".to_string());
            }
            if self.end <= self.start {
                errors.push("Segment end must be after its start".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// An illustration shown while the playhead is inside `[start, end]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllustratedSection {
    pub start: f64,
    pub end: f64,
    pub image_ref: String,
}

impl IllustratedSection {
    pub fn new(start: f64, end: f64, image_ref: impl Into<String>) -> Self {
        Self {
            start,
            end,
            image_ref: image_ref.into(),
        }
    }

    /// Checks if a position falls within this section (both bounds inclusive)
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }
}

/// Represents a complete audiobook track
///
/// A track is immutable once built: the constructor checks the segment
/// invariants so playback code can index segments without re-validating.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    title: String,
    author: String,
    cover_image_ref: String,
    audio_ref: String,
    duration_secs: u64,
    segments: Vec<Segment>,
    transcript: String,
    sections: Vec<IllustratedSection>,
}

impl Track {
    /// Creates a track, validating the segment layout
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        audio_ref: impl Into<String>,
        duration_secs: u64,
        segments: Vec<Segment>,
    ) -> Result<Self> {
        let track = Self {
            title: title.into(),
            author: author.into(),
            cover_image_ref: String::new(),
            audio_ref: audio_ref.into(),
            duration_secs,
            segments,
            transcript: String::new(),
            sections: Vec::new(),
        };

        track.validate().map_err(|reasons| AppError::InvalidTrack {
            title: track.title.clone(),
            reasons,
        })?;

        Ok(track)
    }

    /// Sets the cover image reference
    pub fn with_cover_image(mut self, cover_image_ref: impl Into<String>) -> Self {
        self.cover_image_ref = cover_image_ref.into();
        self
    }

    /// Sets the transcript text
    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = transcript.into();
        self
    }

    /// Sets the illustrated sections, ordered by start time
    pub fn with_sections(mut self, mut sections: Vec<IllustratedSection>) -> Self {
        sections.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.sections = sections;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn cover_image_ref(&self) -> &str {
        &self.cover_image_ref
    }

    pub fn audio_ref(&self) -> &str {
        &self.audio_ref
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn sections(&self) -> &[IllustratedSection] {
        &self.sections
    }

    /// Returns the number of segments (always at least one)
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Gets a segment by index
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Index of the last segment
    pub fn last_segment_index(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Finds the segment the given position belongs to
    ///
    /// Returns the greatest `i` with `segments[i].start <= position`, or 0
    /// when the position precedes the first segment. Segment starts are
    /// sorted, so this is a binary search.
    pub fn segment_index_at(&self, position: f64) -> usize {
        let started = self.segments.partition_point(|s| s.start <= position);
        started.saturating_sub(1)
    }

    /// Finds the first illustrated section containing the given position
    pub fn section_at(&self, position: f64) -> Option<&IllustratedSection> {
        self.sections.iter().find(|s| s.contains(position))
    }
}

impl Validator for Track {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if self.segments.is_empty() {
            errors.push("Track must have at least one segment".to_string());
        }

        for (index, segment) in self.segments.iter().enumerate() {
            if let Err(reasons) = segment.validate() {
                errors.extend(reasons.into_iter().map(|r| format!("segment {}: {}", index, r)));
            }
        }

        for (index, pair) in self.segments.windows(2).enumerate() {
            if pair[0].end > pair[1].start {
                errors.push(format!(
                    "segment {} overlaps segment {} ({} > {})",
                    index,
                    index + 1,
                    pair[0].end,
                    pair[1].start
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
