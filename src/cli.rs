use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::Input;

use crate::config::{self, Config, SpotifyConfig, YouTubeConfig};
use crate::core::classifier;
use crate::core::fetcher::Fetcher;
use crate::core::locator::Locator;
use crate::core::pipeline::{Coordinator, PipelineObserver, TrackState};
use crate::core::resolver::Resolver;
use crate::core::tagger::{Id3TagStore, TagWriter};
use crate::core::transcoder::Transcoder;
use crate::engines::ffmpeg::Ffmpeg;
use crate::engines::ytdlp::YtDlp;
use crate::models::{BatchReport, Outcome, TagReport, TrackDescriptor};
use crate::sources::artwork::HttpArtwork;
use crate::sources::spotify::SpotifyClient;
use crate::sources::youtube::YouTubeClient;

#[derive(Parser)]
#[command(
    name = "songman",
    about = "Download Spotify tracks and playlists as tagged MP3 files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Spotify 트랙 또는 플레이리스트 URL (생략하면 입력받음)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// 저장 디렉토리 (기본값: ./music)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// 디버그 로그 출력
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Spotify/YouTube API 자격증명 설정
    Config,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Config) => cmd_config(),
        None => cmd_download(cli.url, cli.output).await,
    }
}

async fn cmd_download(url: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let mut cfg = config::load_config();
    if let Some(dir) = output {
        cfg.output_dir = Some(dir);
    }
    cfg.ensure_credentials()?;

    let reference = match url {
        Some(url) => url,
        None => Input::<String>::new()
            .with_prompt("Enter a catalog URL")
            .interact_text()?,
    };
    let catalog_ref = classifier::classify(&reference)?;

    let coordinator = build_coordinator(&cfg).await?;
    let mut console = ConsoleObserver;
    let report = coordinator.run_ref(&catalog_ref, &mut console).await?;

    print_report(&report);
    Ok(())
}

async fn build_coordinator(cfg: &Config) -> Result<Coordinator> {
    let spotify = SpotifyClient::connect(&cfg.spotify)
        .await
        .context("could not connect to Spotify")?;
    let youtube = YouTubeClient::new(&cfg.youtube)?;

    Ok(Coordinator::new(
        Resolver::new(Arc::new(spotify)),
        Locator::new(Arc::new(youtube)),
        Fetcher::new(Arc::new(YtDlp::new(&cfg.tools.ytdlp))),
        Transcoder::new(Arc::new(Ffmpeg::new(&cfg.tools.ffmpeg))),
        TagWriter::new(Arc::new(HttpArtwork::new()), Arc::new(Id3TagStore)),
        cfg.output_dir(),
    ))
}

/// Prints per-track progress to stdout.
struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn batch_resolved(&mut self, tracks: &[TrackDescriptor]) {
        println!("Found {} track(s).\n", tracks.len());
    }

    fn track_started(&mut self, index: usize, total: usize, track: &TrackDescriptor) {
        println!("({}/{}) Downloading '{}'...", index + 1, total, track.summary());
    }

    fn transition(&mut self, _index: usize, _track: &TrackDescriptor, state: &TrackState) {
        match state {
            TrackState::Skipped(_) => println!("File exists. Skipping..."),
            TrackState::Fetched(staged) => println!("Processing - {}", file_name(staged)),
            TrackState::Transcoded(file) => {
                println!("Finished - {} KB converted", file.output_bytes / 1024)
            }
            TrackState::Tagged(TagReport::Tagged) => println!("Successfully set metadata"),
            TrackState::Tagged(TagReport::ArtworkUnavailable(reason)) => {
                println!("Error fetching album art: {}", reason)
            }
            TrackState::Tagged(TagReport::WriteFailed(e)) => {
                println!("Error setting metadata: {}", e.message)
            }
            TrackState::Failed(e) => println!("Failed: {}", e),
            _ => {}
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn outcome_table(report: &BatchReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Track", "Result", "Detail"]);

    for (i, row) in report.tracks.iter().enumerate() {
        let detail = match &row.outcome {
            Outcome::Failed(e) => e.to_string(),
            Outcome::Downloaded {
                tags: TagReport::ArtworkUnavailable(reason),
            } => reason.clone(),
            Outcome::Downloaded {
                tags: TagReport::WriteFailed(e),
            } => e.message.clone(),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(row.track.summary()),
            Cell::new(row.outcome.label()),
            Cell::new(detail),
        ]);
    }
    table
}

fn print_report(report: &BatchReport) {
    let summary = &report.summary;
    if !report.tracks.is_empty() {
        println!("\n{}", outcome_table(report));
    }

    let location = std::fs::canonicalize(&summary.destination)
        .unwrap_or_else(|_| summary.destination.clone());
    println!("\nDownload location: {}", location.display());
    println!(
        "DOWNLOAD COMPLETED: {} song(s) downloaded (skipped: {}, failed: {})",
        summary.ratio(),
        summary.skipped,
        summary.failed
    );
    println!("Total time taken: {} sec", summary.elapsed.as_secs_f64().round());
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_file_config();

    println!("Spotify API credentials");
    println!("(create an app at https://developer.spotify.com/dashboard)\n");

    let client_id: String = Input::new()
        .with_prompt("Client ID")
        .with_initial_text(cfg.spotify.client_id.clone().unwrap_or_default())
        .interact_text()?;

    let client_secret: String = Input::new()
        .with_prompt("Client Secret")
        .with_initial_text(cfg.spotify.client_secret.clone().unwrap_or_default())
        .interact_text()?;

    println!("\nYouTube Data API key");
    println!("(create one at https://console.cloud.google.com/apis/credentials)\n");

    let api_key: String = Input::new()
        .with_prompt("API key")
        .with_initial_text(cfg.youtube.api_key.clone().unwrap_or_default())
        .interact_text()?;

    cfg.spotify = SpotifyConfig {
        client_id: Some(client_id),
        client_secret: Some(client_secret),
    };
    cfg.youtube = YouTubeConfig {
        api_key: Some(api_key),
    };

    config::save_config(&cfg)?;
    println!("\nConfiguration saved.");
    Ok(())
}
