use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_OUTPUT_DIR: &str = "music";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    /// 저장 디렉토리 (작업 디렉토리 기준)
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl SpotifyConfig {
    pub fn is_configured(&self) -> bool {
        self.client_id.as_ref().is_some_and(|s| !s.is_empty())
            && self.client_secret.as_ref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct YouTubeConfig {
    pub api_key: Option<String>,
}

impl YouTubeConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// External programs driven by the fetch and transcode stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ytdlp")]
    pub ytdlp: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: default_ytdlp(),
            ffmpeg: default_ffmpeg(),
        }
    }
}

fn default_ytdlp() -> String {
    "yt-dlp".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

impl Config {
    /// Overrides credentials with `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`
    /// and `YOUTUBE_API_KEY` when they are set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("SPOTIFY_CLIENT_ID") {
            self.spotify.client_id = Some(v);
        }
        if let Some(v) = get("SPOTIFY_CLIENT_SECRET") {
            self.spotify.client_secret = Some(v);
        }
        if let Some(v) = get("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(v);
        }
    }

    /// 조회를 시작하기 전에 모든 자격증명이 있어야 한다.
    pub fn ensure_credentials(&self) -> std::result::Result<(), Error> {
        let mut missing = Vec::new();
        if !self.spotify.is_configured() {
            missing.push("Spotify client_id/client_secret");
        }
        if !self.youtube.is_configured() {
            missing.push("YouTube api_key");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "missing {}. Run 'songman config' or set the environment variables",
                missing.join(" and ")
            )))
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("songman")
        .join("config.toml")
}

/// 설정 파일을 읽는다. 없거나 읽을 수 없으면 기본값을 쓰고,
/// 그 위에 환경 변수를 덮어쓴다.
pub fn load_config() -> Config {
    let mut config = load_file_config();
    config.apply_env();
    config
}

/// 환경 변수를 적용하지 않은 설정 파일 내용.
pub fn load_file_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable config {}: {}", path.display(), e);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}
