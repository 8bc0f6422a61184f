use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{TagWriteError, TrackError};

/// Sentinel used when the catalog leaves a text field empty.
pub const UNKNOWN: &str = "Unknown";

/// What a catalog URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Track,
    Collection,
}

/// A classified catalog URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRef {
    pub kind: RefKind,
    pub id: String,
}

// Raw catalog records, as returned by a `CatalogApi`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogImage {
    pub url: String,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album_id: String,
    pub album_name: String,
    pub album_images: Vec<CatalogImage>,
    pub release_date: Option<String>,
    pub track_number: u32,
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogAlbum {
    pub genres: Vec<String>,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPlaylist {
    pub id: String,
    pub name: String,
    /// `None` when the provider does not report visibility.
    pub public: Option<bool>,
    /// Member track ids in listed order. `None` marks a removed or local track.
    pub track_ids: Vec<Option<String>>,
}

/// Release date with at least year resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl ReleaseDate {
    /// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('-');
        let year_part = parts.next()?;
        if year_part.len() != 4 {
            return None;
        }
        let year = year_part.parse().ok()?;
        let month = match parts.next() {
            Some(m) => Some(m.parse().ok().filter(|m| (1..=12).contains(m))?),
            None => None,
        };
        let day = match parts.next() {
            Some(d) => Some(d.parse().ok().filter(|d| (1..=31).contains(d))?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { year, month, day })
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(m) = self.month {
            write!(f, "-{:02}", m)?;
        }
        if let Some(d) = self.day {
            write!(f, "-{:02}", d)?;
        }
        Ok(())
    }
}

/// Normalized metadata for one track. Built once by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    pub id: String,
    pub artist_name: String,
    pub track_title: String,
    pub album_name: String,
    pub album_artist_name: String,
    pub track_number: u32,
    /// `None` when the catalog date is missing or unreadable.
    pub release_date: Option<ReleaseDate>,
    pub genre: String,
    pub cover_art_url: Option<String>,
    pub all_artists: Vec<String>,
    pub isrc: Option<String>,
}

impl TrackDescriptor {
    pub fn summary(&self) -> String {
        format!("{} - {}", self.artist_name, self.track_title)
    }
}

/// A playable media source found by the search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocator {
    pub video_id: String,
}

impl SourceLocator {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
        }
    }

    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// Result of the tag stage. None of these fail the track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagReport {
    Tagged,
    /// Cover art could not be fetched, so no tags were written.
    ArtworkUnavailable(String),
    WriteFailed(TagWriteError),
}

/// Terminal classification of one track's pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Downloaded { tags: TagReport },
    SkippedExisting,
    Failed(TrackError),
}

impl Outcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Downloaded {
                tags: TagReport::Tagged,
            } => "downloaded",
            Self::Downloaded { .. } => "downloaded (untagged)",
            Self::SkippedExisting => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// One row of the batch report.
#[derive(Debug, Clone)]
pub struct TrackReport {
    pub track: TrackDescriptor,
    pub outcome: Outcome,
}

/// Totals derived from the outcome list once the batch has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub destination: PathBuf,
}

impl BatchSummary {
    pub fn from_outcomes<'a>(
        outcomes: impl IntoIterator<Item = &'a Outcome>,
        elapsed: Duration,
        destination: PathBuf,
    ) -> Self {
        let mut summary = Self {
            downloaded: 0,
            skipped: 0,
            failed: 0,
            total: 0,
            elapsed,
            destination,
        };
        for outcome in outcomes {
            summary.total += 1;
            match outcome {
                Outcome::Downloaded { .. } => summary.downloaded += 1,
                Outcome::SkippedExisting => summary.skipped += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// `downloaded/total`, e.g. `2/3`.
    pub fn ratio(&self) -> String {
        format!("{}/{}", self.downloaded, self.total)
    }
}

/// Everything the coordinator hands back after a batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub tracks: Vec<TrackReport>,
    pub summary: BatchSummary,
}
