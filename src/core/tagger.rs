use std::path::Path;
use std::sync::Arc;

use id3::{Tag, TagLike, Version};

use crate::error::TagWriteError;
use crate::models::{TagReport, TrackDescriptor};
use crate::sources::ArtworkApi;

/// 완성된 파일에 기록할 태그 묶음.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    pub title: String,
    pub artist: String,
    /// 트랙 아티스트. TPE2(performer) 프레임에 기록된다.
    pub performer: String,
    pub album: String,
    pub track_number: u32,
    pub year: Option<i32>,
    pub genre: String,
    pub cover: Vec<u8>,
}

impl TagSet {
    pub fn new(track: &TrackDescriptor, cover: Vec<u8>) -> Self {
        Self {
            title: track.track_title.clone(),
            artist: track.artist_name.clone(),
            performer: track.artist_name.clone(),
            album: track.album_name.clone(),
            track_number: track.track_number,
            year: track.release_date.map(|d| d.year),
            genre: track.genre.clone(),
            cover,
        }
    }
}

/// 미디어 파일에 태그를 제자리에서 기록한다.
pub trait TagStore: Send + Sync {
    fn write(&self, path: &Path, tags: &TagSet) -> Result<(), TagWriteError>;
}

/// ID3v2.4 tags through the `id3` crate.
pub struct Id3TagStore;

impl TagStore for Id3TagStore {
    fn write(&self, path: &Path, tags: &TagSet) -> Result<(), TagWriteError> {
        write_tags(path, tags).map_err(|e| TagWriteError::new(path, e.to_string()))
    }
}

/// TagSet을 MP3 파일에 ID3v2.4 태그로 기록한다.
/// 기존 앨범 아트는 제거하고 새 이미지로 교체한다.
pub fn write_tags(path: &Path, tags: &TagSet) -> id3::Result<()> {
    let mut tag = Tag::read_from_path(path).unwrap_or_else(|_| Tag::new());

    tag.set_title(&tags.title);
    tag.set_artist(&tags.artist);
    tag.set_album_artist(&tags.performer);
    tag.set_album(&tags.album);
    tag.set_track(tags.track_number);
    if let Some(year) = tags.year {
        tag.set_year(year);
    }
    tag.set_genre(&tags.genre);

    tag.remove_all_pictures();
    tag.add_frame(id3::frame::Picture {
        mime_type: detect_mime_type(&tags.cover),
        picture_type: id3::frame::PictureType::CoverFront,
        description: "Album cover".to_string(),
        data: tags.cover.clone(),
    });

    tag.write_to_path(path, Version::Id3v24)
}

/// Fetches cover art and tags the final file.
pub struct TagWriter {
    artwork: Arc<dyn ArtworkApi>,
    store: Arc<dyn TagStore>,
}

impl TagWriter {
    pub fn new(artwork: Arc<dyn ArtworkApi>, store: Arc<dyn TagStore>) -> Self {
        Self { artwork, store }
    }

    /// 트랙을 실패시키지 않는다. 앨범 아트가 없으면 태그를 전혀 쓰지 않는다.
    /// 기록에 실패하면 한 번 재시도한다.
    pub async fn tag(&self, track: &TrackDescriptor, path: &Path) -> TagReport {
        let Some(url) = track.cover_art_url.as_deref() else {
            tracing::warn!("no cover art for '{}', leaving file untagged", track.summary());
            return TagReport::ArtworkUnavailable("no cover art listed".to_string());
        };

        let cover = match self.artwork.fetch_image(url).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("error fetching album art for '{}': {}", track.summary(), e);
                return TagReport::ArtworkUnavailable(e.to_string());
            }
        };

        let tags = Arc::new(TagSet::new(track, cover));
        if let Err(first) = self.write_blocking(path, &tags).await {
            tracing::warn!("{}, retrying once", first);
            if let Err(second) = self.write_blocking(path, &tags).await {
                tracing::warn!("{}", second);
                return TagReport::WriteFailed(second);
            }
        }

        tracing::debug!("tagged {}", path.display());
        TagReport::Tagged
    }

    /// Tag I/O is synchronous file work, so it runs on the blocking pool.
    async fn write_blocking(&self, path: &Path, tags: &Arc<TagSet>) -> Result<(), TagWriteError> {
        let store = Arc::clone(&self.store);
        let tags = Arc::clone(tags);
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || store.write(&owned, &tags))
            .await
            .unwrap_or_else(|e| Err(TagWriteError::new(path, format!("tag task failed: {}", e))))
    }
}

/// 이미지 바이너리의 매직 바이트로 MIME 타입을 판별한다.
fn detect_mime_type(data: &[u8]) -> String {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png".to_string()
    } else {
        "image/jpeg".to_string()
    }
}
