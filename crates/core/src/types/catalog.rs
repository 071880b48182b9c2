//! Catalog decoding
//!
//! The catalog is a JSON array of track records. Segment boundaries arrive
//! as `[start, end]` pairs, and every pair must have exactly two numeric
//! components; anything else is reported as a structured error naming the
//! offending track and segment.

use crate::error::{AppError, Result};
use crate::types::{IllustratedSection, Segment, Track};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// Track record exactly as it appears in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrackRecord {
    title: String,
    author: String,
    #[serde(rename = "imageURL")]
    image_url: String,
    #[serde(rename = "audioURL")]
    audio_url: String,
    duration: u64,
    #[serde(rename = "segmentSeconds")]
    segment_seconds: Vec<Vec<f64>>,
    transcript: String,
    sections: Vec<SectionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SectionRecord {
    start_time: f64,
    end_time: f64,
    image_url: String,
}

impl TrackRecord {
    fn into_track(self) -> Result<Track> {
        let segments = self
            .segment_seconds
            .iter()
            .enumerate()
            .map(|(index, pair)| match pair.as_slice() {
                [start, end] => Ok(Segment::new(*start, *end)),
                _ => Err(AppError::InvalidSegment {
                    track: self.title.clone(),
                    index,
                    reason: format!("expected 2 components, found {}", pair.len()),
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        let sections = self
            .sections
            .into_iter()
            .map(|s| IllustratedSection::new(s.start_time, s.end_time, s.image_url))
            .collect();

        Ok(
            Track::new(self.title, self.author, self.audio_url, self.duration, segments)?
                .with_cover_image(self.image_url)
                .with_transcript(self.transcript)
                .with_sections(sections),
        )
    }

    fn from_track(track: &Track) -> Self {
        Self {
            title: track.title().to_string(),
            author: track.author().to_string(),
            image_url: track.cover_image_ref().to_string(),
            audio_url: track.audio_ref().to_string(),
            duration: track.duration_secs(),
            segment_seconds: track
                .segments()
                .iter()
                .map(|s| vec![s.start, s.end])
                .collect(),
            transcript: track.transcript().to_string(),
            sections: track
                .sections()
                .iter()
                .map(|s| SectionRecord {
                    start_time: s.start,
                    end_time: s.end,
                    image_url: s.image_ref.clone(),
                })
                .collect(),
        }
    }
}

/// Ordered list of decoded tracks
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Arc<Track>>,
}

impl Catalog {
    /// Creates a catalog from already-built tracks
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: tracks.into_iter().map(Arc::new).collect(),
        }
    }

    /// Decodes a catalog from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<TrackRecord> =
            serde_json::from_str(json).map_err(|e| AppError::catalog_decode("invalid catalog JSON", e))?;
        Self::from_records(records)
    }

    /// Decodes a catalog from any reader producing JSON
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let records: Vec<TrackRecord> = serde_json::from_reader(reader)
            .map_err(|e| AppError::catalog_decode("invalid catalog JSON", e))?;
        Self::from_records(records)
    }

    /// Loads and decodes a catalog file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AppError::from_io(path, e))?;
        let catalog = Self::from_reader(BufReader::new(file))?;
        log::info!("Loaded {} tracks from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    fn from_records(records: Vec<TrackRecord>) -> Result<Self> {
        let tracks = records
            .into_iter()
            .map(|record| record.into_track().map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tracks })
    }

    /// Encodes the catalog back into its JSON form
    pub fn to_json_string(&self) -> Result<String> {
        let records: Vec<TrackRecord> = self
            .tracks
            .iter()
            .map(|t| TrackRecord::from_track(t))
            .collect();
        serde_json::to_string_pretty(&records)
            .map_err(|e| AppError::catalog_decode("failed to encode catalog", e))
    }

    /// Returns the number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Returns true if the catalog has no tracks
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Gets a shared handle to a track by index
    pub fn get(&self, index: usize) -> Result<Arc<Track>> {
        self.tracks
            .get(index)
            .cloned()
            .ok_or(AppError::TrackNotFound {
                index,
                available: self.tracks.len(),
            })
    }

    /// Iterates over all tracks
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {
            "title": "The Canterville Ghost",
            "author": "Oscar Wilde",
            "imageURL": "https://example.com/canterville.jpg",
            "audioURL": "cantervilleghost_1.mp3",
            "duration": 40,
            "segmentSeconds": [[0, 10], [10, 25], [25, 40]],
            "transcript": "When Mr. Hiram B. Otis, the American Minister...",
            "sections": [
                { "start_time": 0, "end_time": 20, "image_url": "https://example.com/1.png" },
                { "start_time": 20, "end_time": 40, "image_url": "https://example.com/2.png" }
            ]
        }
    ]"#;

    #[test]
    fn test_decode_sample() {
        let catalog = Catalog::from_json_str(SAMPLE).expect("decodes");
        assert_eq!(catalog.len(), 1);

        let track = catalog.get(0).expect("track 0");
        assert_eq!(track.title(), "The Canterville Ghost");
        assert_eq!(track.cover_image_ref(), "https://example.com/canterville.jpg");
        assert_eq!(track.audio_ref(), "cantervilleghost_1.mp3");
        assert_eq!(track.segment_count(), 3);
        assert_eq!(track.segment(2), Some(&Segment::new(25.0, 40.0)));
        assert_eq!(track.sections().len(), 2);
    }

    #[test]
    fn test_segment_with_three_components_is_rejected() {
        let json = SAMPLE.replace("[10, 25]", "[10, 25, 30]");
        match Catalog::from_json_str(&json) {
            Err(AppError::InvalidSegment { track, index, reason }) => {
                assert_eq!(track, "The Canterville Ghost");
                assert_eq!(index, 1);
                assert!(reason.contains("found 3"));
            }
            other => panic!("expected InvalidSegment, got {:?}", other),
        }
    }

    #[test]
    fn test_segment_with_one_component_is_rejected() {
        let json = SAMPLE.replace("[0, 10]", "[0]");
        assert!(matches!(
            Catalog::from_json_str(&json),
            Err(AppError::InvalidSegment { index: 0, .. })
        ));
    }

    #[test]
    fn test_non_numeric_segment_is_decode_error() {
        let json = SAMPLE.replace("[0, 10]", "[0, \"ten\"]");
        assert!(matches!(
            Catalog::from_json_str(&json),
            Err(AppError::CatalogDecode { .. })
        ));
    }

    #[test]
    fn test_missing_field_is_decode_error() {
        let json = SAMPLE.replace("\"author\": \"Oscar Wilde\",", "");
        let err = Catalog::from_json_str(&json).expect_err("missing author");
        assert!(matches!(err, AppError::CatalogDecode { .. }));
        assert!(err.to_string().contains("invalid catalog JSON"));
    }

    #[test]
    fn test_overlapping_segments_rejected() {
        let json = SAMPLE.replace("[10, 25]", "[5, 25]");
        assert!(matches!(
            Catalog::from_json_str(&json),
            Err(AppError::InvalidTrack { .. })
        ));
    }

    #[test]
    fn test_get_out_of_range() {
        let catalog = Catalog::from_json_str(SAMPLE).expect("decodes");
        assert!(matches!(
            catalog.get(4),
            Err(AppError::TrackNotFound { index: 4, available: 1 })
        ));
    }

    #[test]
    fn test_encode_preserves_tracks() {
        let catalog = Catalog::from_json_str(SAMPLE).expect("decodes");
        let json = catalog.to_json_string().expect("encodes");
        let again = Catalog::from_json_str(&json).expect("decodes again");

        assert_eq!(*again.get(0).unwrap(), *catalog.get(0).unwrap());
        assert!(json.contains("segmentSeconds"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");

        let catalog = Catalog::load(file.path()).expect("loads");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load("/definitely/not/here/catalog.json");
        assert!(matches!(result, Err(AppError::FileNotFound { .. })));
    }
}
