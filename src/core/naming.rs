use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::models::TrackDescriptor;

/// 트랜스코더에 넘기는 컨테이너 포맷.
pub const TARGET_FORMAT: &str = "mp3";

/// 파일명에 사용할 수 없는 문자를 `_`로 치환한다.
pub fn sanitize_filename(s: &str) -> String {
    let cleaned: String = s
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\0' {
                return '_';
            }
            if cfg!(target_os = "windows") {
                if matches!(c, '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                    return '_';
                }
                if c.is_ascii_control() {
                    return '_';
                }
            }
            if cfg!(target_os = "macos") && c == ':' {
                return '_';
            }
            c
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// 트랙의 스테이징 경로. 확장자 없는 정리된 제목을 사용한다.
pub fn destination_stem(dir: &Path, track: &TrackDescriptor) -> PathBuf {
    dir.join(sanitize_filename(&track.track_title))
}

/// 스테이징 경로에 대응하는 최종 경로.
/// 확장자를 교체하지 않고 덧붙이므로 제목에 점이 있어도 잘리지 않는다.
pub fn final_path(stem: &Path) -> PathBuf {
    let mut name = OsString::from(stem.as_os_str());
    name.push(".");
    name.push(TARGET_FORMAT);
    PathBuf::from(name)
}
