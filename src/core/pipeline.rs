//! Per-track acquisition pipeline.
//!
//! Every track walks the same state machine:
//!
//! ```text
//! Resolved -> Located -> Fetched -> Transcoded -> Tagged -> Done
//!                    \-> Skipped ------------------------/
//! ```
//!
//! `Failed` is absorbing and reachable from `Resolved`, `Located` and
//! `Fetched`. Tagging never fails a track. Tracks run strictly one after
//! another in resolved order.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::classifier;
use crate::core::fetcher::{FetchResult, Fetcher};
use crate::core::locator::Locator;
use crate::core::naming;
use crate::core::resolver::Resolver;
use crate::core::tagger::TagWriter;
use crate::core::transcoder::{TranscodedFile, Transcoder};
use crate::error::{Result, TrackError};
use crate::models::{
    BatchReport, BatchSummary, CatalogRef, Outcome, RefKind, SourceLocator, TagReport,
    TrackDescriptor, TrackReport,
};

/// Where a single track currently is in its pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackState {
    Resolved,
    Located(SourceLocator),
    Fetched(PathBuf),
    Skipped(PathBuf),
    Transcoded(TranscodedFile),
    Tagged(TagReport),
    Done(Outcome),
    Failed(TrackError),
}

impl TrackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }
}

/// Receives progress events. Purely observational.
pub trait PipelineObserver {
    fn batch_resolved(&mut self, _tracks: &[TrackDescriptor]) {}
    fn track_started(&mut self, _index: usize, _total: usize, _track: &TrackDescriptor) {}
    fn transition(&mut self, _index: usize, _track: &TrackDescriptor, _state: &TrackState) {}
    fn track_finished(&mut self, _index: usize, _track: &TrackDescriptor, _outcome: &Outcome) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Sequences the pipeline stages over a resolved batch.
pub struct Coordinator {
    resolver: Resolver,
    locator: Locator,
    fetcher: Fetcher,
    transcoder: Transcoder,
    tagger: TagWriter,
    destination: PathBuf,
}

impl Coordinator {
    pub fn new(
        resolver: Resolver,
        locator: Locator,
        fetcher: Fetcher,
        transcoder: Transcoder,
        tagger: TagWriter,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            locator,
            fetcher,
            transcoder,
            tagger,
            destination: destination.into(),
        }
    }

    /// Classifies `reference` and runs the batch. Malformed references fail
    /// before any catalog request.
    pub async fn run(
        &self,
        reference: &str,
        observer: &mut dyn PipelineObserver,
    ) -> Result<BatchReport> {
        let catalog_ref = classifier::classify(reference)?;
        self.run_ref(&catalog_ref, observer).await
    }

    /// Resolves the whole track list, then materializes it track by track.
    pub async fn run_ref(
        &self,
        catalog_ref: &CatalogRef,
        observer: &mut dyn PipelineObserver,
    ) -> Result<BatchReport> {
        let tracks = self.resolve(catalog_ref).await?;
        observer.batch_resolved(&tracks);

        tokio::fs::create_dir_all(&self.destination).await?;

        let start = Instant::now();
        let total = tracks.len();
        let mut reports = Vec::with_capacity(total);

        for (index, track) in tracks.into_iter().enumerate() {
            observer.track_started(index, total, &track);
            let outcome = self.process(index, &track, observer).await;
            observer.track_finished(index, &track, &outcome);
            reports.push(TrackReport { track, outcome });
        }

        let summary = BatchSummary::from_outcomes(
            reports.iter().map(|r| &r.outcome),
            start.elapsed(),
            self.destination.clone(),
        );
        tracing::info!(
            "batch finished: {} downloaded in {:.1}s",
            summary.ratio(),
            summary.elapsed.as_secs_f64()
        );

        Ok(BatchReport {
            tracks: reports,
            summary,
        })
    }

    async fn resolve(&self, catalog_ref: &CatalogRef) -> Result<Vec<TrackDescriptor>> {
        match catalog_ref.kind {
            RefKind::Track => Ok(vec![self.resolver.resolve_track(&catalog_ref.id).await?]),
            RefKind::Collection => self.resolver.resolve_collection(&catalog_ref.id).await,
        }
    }

    /// Drives one track from `Resolved` to a terminal state.
    pub async fn process(
        &self,
        index: usize,
        track: &TrackDescriptor,
        observer: &mut dyn PipelineObserver,
    ) -> Outcome {
        let stem = naming::destination_stem(&self.destination, track);
        tracing::debug!(
            "processing {} [{}] by {} on {} by {} ({}, isrc {:?})",
            track.id,
            track.track_title,
            track.all_artists.join(", "),
            track.album_name,
            track.album_artist_name,
            track
                .release_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "undated".to_string()),
            track.isrc
        );
        let mut state = TrackState::Resolved;

        loop {
            state = self.step(track, &stem, state).await;
            observer.transition(index, track, &state);
            match state {
                TrackState::Done(outcome) => return outcome,
                TrackState::Failed(reason) => {
                    tracing::warn!("'{}' failed: {}", track.summary(), reason);
                    return Outcome::Failed(reason);
                }
                next => state = next,
            }
        }
    }

    /// Performs exactly one transition.
    pub async fn step(&self, track: &TrackDescriptor, stem: &Path, state: TrackState) -> TrackState {
        match state {
            terminal if terminal.is_terminal() => terminal,
            TrackState::Resolved => match self.locator.locate(track).await {
                Ok(locator) => TrackState::Located(locator),
                Err(e) => TrackState::Failed(e),
            },
            TrackState::Located(locator) => match self.fetcher.fetch(&locator, stem).await {
                Ok(FetchResult::Staged(staged)) => TrackState::Fetched(staged),
                Ok(FetchResult::AlreadyMaterialized(existing)) => TrackState::Skipped(existing),
                Err(e) => TrackState::Failed(e),
            },
            TrackState::Skipped(_) => TrackState::Done(Outcome::SkippedExisting),
            TrackState::Fetched(staged) => {
                let result = self.transcoder.transcode(&staged).await;
                self.transcoder.remove_source(&staged).await;
                match result {
                    Ok(file) => TrackState::Transcoded(file),
                    Err(e) => TrackState::Failed(e),
                }
            }
            TrackState::Transcoded(file) => {
                TrackState::Tagged(self.tagger.tag(track, &file.path).await)
            }
            TrackState::Tagged(tags) => TrackState::Done(Outcome::Downloaded { tags }),
            TrackState::Done(_) | TrackState::Failed(_) => state,
        }
    }
}
