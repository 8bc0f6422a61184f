//! Test doubles for every pipeline collaborator.
//!
//! Mocks use interior mutability so they can be shared through `Arc` with the
//! component under test and still be configured and inspected afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::core::fetcher::Fetcher;
use crate::core::locator::Locator;
use crate::core::pipeline::Coordinator;
use crate::core::resolver::Resolver;
use crate::core::tagger::{TagSet, TagStore, TagWriter};
use crate::core::transcoder::Transcoder;
use crate::engines::{AudioStreamer, TranscodeEngine, TranscodeStats};
use crate::error::{CatalogError, TagWriteError, TrackError};
use crate::models::{
    CatalogAlbum, CatalogImage, CatalogPlaylist, CatalogTrack, ReleaseDate, SourceLocator,
    TrackDescriptor, UNKNOWN,
};
use crate::sources::{ArtworkApi, CatalogApi, SearchApi};

/// A fully resolved descriptor with cover art.
pub fn descriptor(id: &str, artist: &str, title: &str) -> TrackDescriptor {
    TrackDescriptor {
        id: id.to_string(),
        artist_name: artist.to_string(),
        track_title: title.to_string(),
        album_name: "Album".to_string(),
        album_artist_name: artist.to_string(),
        track_number: 1,
        release_date: Some(ReleaseDate {
            year: 2001,
            month: Some(5),
            day: Some(1),
        }),
        genre: UNKNOWN.to_string(),
        cover_art_url: Some(format!("https://img.example/{}/300", id)),
        all_artists: vec![artist.to_string()],
        isrc: None,
    }
}

/// A raw catalog track on album `album-<id>` with three cover sizes.
pub fn catalog_track(id: &str, artist: &str, title: &str) -> CatalogTrack {
    CatalogTrack {
        id: id.to_string(),
        name: title.to_string(),
        artists: vec![artist.to_string()],
        album_id: format!("album-{}", id),
        album_name: "Album".to_string(),
        album_images: [640, 300, 64]
            .into_iter()
            .map(|w| CatalogImage {
                url: format!("https://img.example/{}/{}", id, w),
                width: Some(w),
            })
            .collect(),
        release_date: Some("2001-05-01".to_string()),
        track_number: 1,
        isrc: None,
    }
}

/// Video id the catch-all search returns for `"{artist} {title}"`.
pub fn video_id_for(artist: &str, title: &str) -> String {
    format!("vid-{} {}", artist, title).replace(' ', "-")
}

#[derive(Default)]
pub struct MockCatalog {
    tracks: Mutex<HashMap<String, Result<CatalogTrack, CatalogError>>>,
    albums: Mutex<HashMap<String, CatalogAlbum>>,
    playlists: Mutex<HashMap<String, CatalogPlaylist>>,
    track_calls: AtomicUsize,
    other_calls: AtomicUsize,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(self, track: CatalogTrack) -> Self {
        self.add_track(track);
        self
    }

    pub fn with_track_error(self, id: &str, error: CatalogError) -> Self {
        self.tracks.lock().unwrap().insert(id.to_string(), Err(error));
        self
    }

    pub fn with_album(self, id: &str, album: CatalogAlbum) -> Self {
        self.albums.lock().unwrap().insert(id.to_string(), album);
        self
    }

    pub fn with_playlist(self, id: &str, public: Option<bool>, members: Vec<Option<&str>>) -> Self {
        self.add_playlist(id, public, members);
        self
    }

    pub fn add_track(&self, track: CatalogTrack) {
        self.tracks
            .lock()
            .unwrap()
            .insert(track.id.clone(), Ok(track));
    }

    pub fn add_playlist(&self, id: &str, public: Option<bool>, members: Vec<Option<&str>>) {
        self.playlists.lock().unwrap().insert(
            id.to_string(),
            CatalogPlaylist {
                id: id.to_string(),
                name: format!("Playlist {}", id),
                public,
                track_ids: members
                    .into_iter()
                    .map(|m| m.map(str::to_string))
                    .collect(),
            },
        );
    }

    pub fn track_calls(&self) -> usize {
        self.track_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.track_calls() + self.other_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn get_track(&self, id: &str) -> Result<CatalogTrack, CatalogError> {
        self.track_calls.fetch_add(1, Ordering::SeqCst);
        self.tracks
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(CatalogError::NotFound(format!("track {}", id))))
    }

    async fn get_album(&self, id: &str) -> Result<CatalogAlbum, CatalogError> {
        self.other_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .albums
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist, CatalogError> {
        self.other_calls.fetch_add(1, Ordering::SeqCst);
        self.playlists
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("playlist {}", id)))
    }
}

/// Search double. By default nothing matches; `matching_everything` answers
/// every unconfigured query with a video id derived from it.
#[derive(Default)]
pub struct MockSearch {
    results: Mutex<HashMap<String, Vec<SourceLocator>>>,
    failures: Mutex<HashMap<String, String>>,
    match_all: bool,
    calls: AtomicUsize,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching_everything() -> Self {
        Self {
            match_all: true,
            ..Self::default()
        }
    }

    pub fn with_results(self, query: &str, results: Vec<SourceLocator>) -> Self {
        self.set_results(query, results);
        self
    }

    pub fn set_results(&self, query: &str, results: Vec<SourceLocator>) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), results);
    }

    /// Answers `query` with a transport error instead of results.
    pub fn set_failure(&self, query: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(query.to_string(), message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchApi for MockSearch {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SourceLocator>, TrackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failures.lock().unwrap().get(query) {
            return Err(TrackError::Search(message.clone()));
        }
        if let Some(found) = self.results.lock().unwrap().get(query) {
            return Ok(found.iter().take(limit as usize).cloned().collect());
        }
        if self.match_all {
            let core = query.trim_end_matches(" audio");
            return Ok(vec![SourceLocator::new(
                format!("vid-{}", core).replace(' ', "-"),
            )]);
        }
        Ok(Vec::new())
    }
}

/// Streamer double that writes a fixed payload, or fails for chosen videos
/// after writing a partial file.
pub struct MockStreamer {
    payload: Mutex<Vec<u8>>,
    failures: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl MockStreamer {
    pub fn new() -> Self {
        Self {
            payload: Mutex::new(b"webm audio bytes".to_vec()),
            failures: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_payload(self, payload: Vec<u8>) -> Self {
        *self.payload.lock().unwrap() = payload;
        self
    }

    pub fn failing_for(self, video_id: &str, message: &str) -> Self {
        self.add_failure(video_id, message);
        self
    }

    pub fn add_failure(&self, video_id: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(video_id.to_string(), message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioStreamer for MockStreamer {
    async fn stream_to(&self, locator: &SourceLocator, dest: &Path) -> Result<u64, TrackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.failures.lock().unwrap().get(&locator.video_id).cloned();
        if let Some(message) = failure {
            let _ = tokio::fs::write(dest, b"partial").await;
            return Err(TrackError::Fetch(message));
        }
        let payload = self.payload.lock().unwrap().clone();
        tokio::fs::write(dest, &payload)
            .await
            .map_err(|e| TrackError::Fetch(e.to_string()))?;
        Ok(payload.len() as u64)
    }
}

/// Transcoder double that copies input to output unchanged. Failures leave a
/// truncated output behind, the way a real encoder does.
#[derive(Default)]
pub struct MockEngine {
    fail_all: Option<String>,
    failures: Mutex<HashMap<String, String>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_all: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Fails when the input file is named `file_name`.
    pub fn add_failure(&self, file_name: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(file_name.to_string(), message.to_string());
    }
}

#[async_trait]
impl TranscodeEngine for MockEngine {
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        _format: &str,
    ) -> Result<TranscodeStats, TrackError> {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let failure = self
            .fail_all
            .clone()
            .or_else(|| self.failures.lock().unwrap().get(&name).cloned());
        if let Some(message) = failure {
            let _ = tokio::fs::write(output, b"ID3").await;
            return Err(TrackError::Transcode(message));
        }
        let output_bytes = tokio::fs::copy(input, output)
            .await
            .map_err(|e| TrackError::Transcode(e.to_string()))?;
        Ok(TranscodeStats { output_bytes })
    }
}

pub struct MockArtwork {
    result: Mutex<Result<Vec<u8>, CatalogError>>,
    calls: AtomicUsize,
}

impl MockArtwork {
    pub fn ok(data: Vec<u8>) -> Self {
        Self {
            result: Mutex::new(Ok(data)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: CatalogError) -> Self {
        Self {
            result: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failure(&self, error: CatalogError) {
        *self.result.lock().unwrap() = Err(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtworkApi for MockArtwork {
    async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().unwrap().clone()
    }
}

/// Tag store double that fails a set number of times, then succeeds.
#[derive(Default)]
pub struct MockTagStore {
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
}

impl MockTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_times(n: usize) -> Self {
        let store = Self::default();
        store.set_failures(n);
        store
    }

    pub fn set_failures(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl TagStore for MockTagStore {
    fn write(&self, path: &Path, _tags: &TagSet) -> Result<(), TagWriteError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(TagWriteError::new(path, "device busy"));
        }
        Ok(())
    }
}

/// A coordinator wired to mocks and a temporary destination directory.
pub struct Harness {
    pub catalog: Arc<MockCatalog>,
    pub search: Arc<MockSearch>,
    pub streamer: Arc<MockStreamer>,
    pub engine: Arc<MockEngine>,
    pub artwork: Arc<MockArtwork>,
    pub tags: Arc<MockTagStore>,
    videos: HashMap<String, String>,
    dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("music")).unwrap();
        Self {
            catalog: Arc::new(MockCatalog::new()),
            search: Arc::new(MockSearch::matching_everything()),
            streamer: Arc::new(MockStreamer::new()),
            engine: Arc::new(MockEngine::new()),
            artwork: Arc::new(MockArtwork::ok(vec![0xFF, 0xD8, 0xFF, 0xE0])),
            tags: Arc::new(MockTagStore::new()),
            videos: HashMap::new(),
            dir,
        }
    }

    pub fn track(mut self, id: &str, artist: &str, title: &str) -> Self {
        self.catalog.add_track(catalog_track(id, artist, title));
        self.videos
            .insert(id.to_string(), video_id_for(artist, title));
        self
    }

    pub fn playlist(self, id: &str, public: bool, members: &[&str]) -> Self {
        self.catalog
            .add_playlist(id, Some(public), members.iter().map(|m| Some(*m)).collect());
        self
    }

    pub fn no_results_for(self, query: &str) -> Self {
        self.search.set_results(query, Vec::new());
        self
    }

    pub fn fetch_fails_for(self, track_id: &str) -> Self {
        let video = self.videos[track_id].clone();
        self.streamer.add_failure(&video, "Video unavailable");
        self
    }

    pub fn search_fails_for(self, query: &str) -> Self {
        self.search.set_failure(query, "connection reset by peer");
        self
    }

    pub fn transcode_fails_for(self, file_name: &str) -> Self {
        self.engine
            .add_failure(file_name, "Invalid data found when processing input");
        self
    }

    pub fn artwork_unavailable(self) -> Self {
        self.artwork.set_failure(CatalogError::Status {
            status: 404,
            url: "https://img.example/missing".to_string(),
        });
        self
    }

    pub fn tag_writes_fail(self) -> Self {
        self.tags.set_failures(usize::MAX);
        self
    }

    pub fn dir(&self) -> PathBuf {
        self.dir.path().join("music")
    }

    pub fn coordinator(&self) -> Coordinator {
        Coordinator::new(
            Resolver::new(self.catalog.clone()),
            Locator::new(self.search.clone()),
            Fetcher::new(self.streamer.clone()),
            Transcoder::new(self.engine.clone()),
            TagWriter::new(self.artwork.clone(), self.tags.clone()),
            self.dir(),
        )
    }
}
