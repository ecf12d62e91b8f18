//! Data model for the enrichment pipeline
//!
//! The pipeline resolves a [`SongQuery`] into an [`EnrichedSong`] by merging
//! two independent sources: catalog track metadata and a scraped chord sheet.
//! Either source may be absent; the merged record is always well-formed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder stored in `notes` when no chord sheet could be found
pub const SHEET_NOT_FOUND_NOTE: &str = "Chord sheet not found";

/// Song query validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Song title must not be empty")]
    EmptyTitle,

    #[error("Artist name must not be empty")]
    EmptyArtist,
}

/// Validated enrichment input: song title plus artist name
///
/// Construction is the single validation point for caller input; both fields
/// are stored trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongQuery {
    pub title: String,
    pub artist: String,
}

impl SongQuery {
    pub fn new(title: &str, artist: &str) -> Result<Self, QueryError> {
        let title = title.trim();
        let artist = artist.trim();

        if title.is_empty() {
            return Err(QueryError::EmptyTitle);
        }
        if artist.is_empty() {
            return Err(QueryError::EmptyArtist);
        }

        Ok(Self {
            title: title.to_string(),
            artist: artist.to_string(),
        })
    }
}

/// Resolved catalog metadata for the best-matching track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    /// Track title as spelled by the catalog
    pub corrected_title: String,
    /// Artist name(s) as spelled by the catalog
    pub corrected_artist: String,
    /// Track duration in whole seconds (rounded half-up from milliseconds)
    pub duration_seconds: u32,
    /// Tempo in whole BPM; `None` when the catalog has no tempo analysis
    pub bpm: Option<u32>,
}

/// Plain-text chord sheet extracted from a chord-sheet page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordSheet {
    /// Musical key label; empty string when the page carries none
    pub key: String,
    /// Chord/lyric text with line structure preserved, markup stripped
    pub body: String,
}

/// Final merged enrichment record returned to the caller
///
/// Every field has a defined value regardless of which upstream sources
/// succeeded: naming falls back to the caller's query, `notes` falls back to
/// [`SHEET_NOT_FOUND_NOTE`], and catalog-only fields fall back to `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSong {
    pub name: String,
    pub artist: String,
    pub key: String,
    pub notes: String,
    pub bpm: Option<u32>,
    pub duration_seconds: Option<u32>,
}

impl EnrichedSong {
    /// Merge per-branch results into the final record
    pub fn merge(
        query: &SongQuery,
        track: Option<TrackMetadata>,
        sheet: Option<ChordSheet>,
    ) -> Self {
        let (name, artist, bpm, duration_seconds) = match track {
            Some(track) => (
                track.corrected_title,
                track.corrected_artist,
                track.bpm,
                Some(track.duration_seconds),
            ),
            None => (query.title.clone(), query.artist.clone(), None, None),
        };

        let (key, notes) = match sheet {
            Some(sheet) => (sheet.key, sheet.body),
            None => (String::new(), SHEET_NOT_FOUND_NOTE.to_string()),
        };

        Self {
            name,
            artist,
            key,
            notes,
            bpm,
            duration_seconds,
        }
    }
}
