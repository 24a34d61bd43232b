//! Batch orchestration
//!
//! Evaluates every tagged reference video against a shared candidate pool.
//! Candidates are decoded or transcribed at most once per run; transcripts
//! additionally persist across runs through the durable cache. A failing
//! reference is recorded and the batch moves on.

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use audiosync_cache::{cache_key, TranscriptCache};

use crate::config::BatchConfig;
use crate::error::{Result, SyncError};
use crate::matching::{self, MatchMethod, MatchResult};
use crate::media::{MediaTranscoder, Transcriber};
use crate::pool::CandidatePool;
use crate::signal::Signal;
use crate::tags::VideoTags;
use crate::transcript::Transcript;

/// Cache tag for transcripts of a video's embedded track
pub const VIDEO_TAG: &str = "video";
/// Cache tag for transcripts of standalone candidate recordings
pub const AUDIO_TAG: &str = "audio";

/// Terminal state of one reference after a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// A winning candidate was muxed into the reference video
    Synced,
    /// Matched but not synced: dry run, no winner, or below threshold
    Skipped,
    /// The reference itself could not be processed
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Skipped => "skipped",
            SyncStatus::Failed => "failed",
        }
    }
}

/// Outcome recorded for one reference
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceReport {
    pub reference: String,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReferenceReport {
    fn failed(reference: &str, error: SyncError) -> Self {
        log::warn!("{}: {}", reference, error);
        Self {
            reference: reference.to_string(),
            status: SyncStatus::Failed,
            result: None,
            output: None,
            error: Some(error.to_string()),
        }
    }
}

/// Summary of a whole batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub references: Vec<ReferenceReport>,
}

impl BatchReport {
    pub fn count(&self, status: SyncStatus) -> usize {
        self.references
            .iter()
            .filter(|r| r.status == status)
            .count()
    }
}

/// Drives a batch run over tagged references and a candidate pool.
pub struct BatchRunner<'a> {
    transcoder: &'a dyn MediaTranscoder,
    transcriber: &'a dyn Transcriber,
    cache: &'a TranscriptCache,
    config: &'a BatchConfig,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        transcoder: &'a dyn MediaTranscoder,
        transcriber: &'a dyn Transcriber,
        cache: &'a TranscriptCache,
        config: &'a BatchConfig,
    ) -> Self {
        Self {
            transcoder,
            transcriber,
            cache,
            config,
        }
    }

    pub fn run(&self) -> Result<BatchReport> {
        self.config.matching.validate()?;

        let tags = VideoTags::load(&self.config.tags_file)?;
        let references = tags.references(&self.config.path_filter);
        if references.is_empty() {
            log::warn!(
                "no reference videos in {} match filter {:?}",
                self.config.tags_file.display(),
                self.config.path_filter
            );
            return Ok(BatchReport::default());
        }
        log::info!("found {} reference video(s)", references.len());

        let pool = CandidatePool::discover(&self.config.audio_dir)?;
        log::info!(
            "found {} candidate audio file(s) in {}",
            pool.len(),
            self.config.audio_dir.display()
        );

        let total = references.len();
        let mut report = BatchReport::default();
        match self.config.method {
            MatchMethod::Transcript => {
                let candidates = self.transcribe_pool(&pool);
                for (index, (name, _)) in references.iter().enumerate() {
                    log::info!("[{}/{}] {}", index + 1, total, name);
                    report
                        .references
                        .push(self.match_by_transcript(name.as_str(), &candidates));
                }
            }
            MatchMethod::Waveform => {
                let candidates =
                    load_candidate_signals(self.transcoder, &pool, &self.config.matching);
                for (index, (name, _)) in references.iter().enumerate() {
                    log::info!("[{}/{}] {}", index + 1, total, name);
                    report
                        .references
                        .push(self.match_by_waveform(name.as_str(), &candidates));
                }
            }
        }

        log::info!(
            "batch complete: {} synced, {} skipped, {} failed",
            report.count(SyncStatus::Synced),
            report.count(SyncStatus::Skipped),
            report.count(SyncStatus::Failed)
        );
        Ok(report)
    }

    /// Transcribe every candidate once, through the single-flight cache.
    fn transcribe_pool(&self, pool: &CandidatePool) -> Vec<(String, Transcript)> {
        let duration = self.config.matching.transcribe_duration_s;
        pool.files
            .par_iter()
            .filter_map(|path| {
                let key = cache_key(AUDIO_TAG, path);
                let computed = self.cache.get_or_compute(&key, || {
                    log::info!("transcribing {}", path.display());
                    self.transcriber.transcribe(path, Some(duration))
                });
                match computed {
                    Ok(text) => Some((path.display().to_string(), Transcript::new(text, duration))),
                    Err(e) => {
                        log::warn!("excluding candidate {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect()
    }

    fn match_by_transcript(
        &self,
        name: &str,
        candidates: &[(String, Transcript)],
    ) -> ReferenceReport {
        let video = self.video_path(name);
        if !video.exists() {
            return ReferenceReport::failed(name, SyncError::NotFound(video));
        }

        let duration = self.config.matching.transcribe_duration_s;
        let key = cache_key(VIDEO_TAG, &video);
        let text = match self.cache.get_or_compute(&key, || {
            log::info!("transcribing {}", video.display());
            self.transcriber.transcribe(&video, Some(duration))
        }) {
            Ok(text) => text,
            Err(e) => return ReferenceReport::failed(name, e),
        };

        let reference = Transcript::new(text, duration);
        let result =
            matching::rank_transcript(name, &reference, candidates, &self.config.matching);
        self.finish(name, &video, result)
    }

    fn match_by_waveform(&self, name: &str, candidates: &[(String, Signal)]) -> ReferenceReport {
        let video = self.video_path(name);
        if !video.exists() {
            return ReferenceReport::failed(name, SyncError::NotFound(video));
        }

        let matching_config = &self.config.matching;
        let reference = match Signal::load(
            self.transcoder,
            &video,
            Some(matching_config.analysis_duration_s),
            matching_config.analysis_sample_rate,
        ) {
            Ok(signal) => signal,
            Err(e) => return ReferenceReport::failed(name, e),
        };

        let result = matching::rank_waveform(name, &reference, candidates);
        self.finish(name, &video, result)
    }

    /// Route a match result to its terminal state, muxing when eligible.
    fn finish(&self, name: &str, video: &Path, result: MatchResult) -> ReferenceReport {
        match &result.candidate {
            Some(candidate) => log::info!(
                "{}: match {} (score {:.4}, offset {:+.2}s)",
                name,
                candidate,
                result.score,
                result.offset_seconds
            ),
            None => log::info!("{}: no match", name),
        }

        let eligible = result.meets_threshold(self.config.accept_threshold);
        let candidate = match result.candidate.as_deref() {
            Some(candidate) if eligible && !self.config.dry_run => candidate.to_string(),
            _ => {
                return ReferenceReport {
                    reference: name.to_string(),
                    status: SyncStatus::Skipped,
                    result: Some(result),
                    output: None,
                    error: None,
                };
            }
        };

        let output = self.output_path(name);
        if let Some(parent) = output.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return ReferenceReport {
                    reference: name.to_string(),
                    status: SyncStatus::Failed,
                    result: Some(result),
                    output: None,
                    error: Some(e.to_string()),
                };
            }
        }

        match self
            .transcoder
            .mux(video, Path::new(&candidate), result.offset_seconds, &output)
        {
            Ok(()) => {
                log::info!("{}: wrote {}", name, output.display());
                ReferenceReport {
                    reference: name.to_string(),
                    status: SyncStatus::Synced,
                    result: Some(result),
                    output: Some(output),
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("{}: {}", name, e);
                ReferenceReport {
                    reference: name.to_string(),
                    status: SyncStatus::Failed,
                    result: Some(result),
                    output: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Tagged names refer to the raw recordings; the matching runs against
    /// the processed renders, which share the stem with an .mp4 extension.
    fn video_path(&self, name: &str) -> PathBuf {
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        self.config.video_dir.join(format!("{stem}.mp4"))
    }

    fn output_path(&self, name: &str) -> PathBuf {
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        self.config.output_dir.join(format!("{stem}_synced.mp4"))
    }
}

/// Decode every candidate once per run; failures are logged and excluded.
pub(crate) fn load_candidate_signals(
    transcoder: &dyn MediaTranscoder,
    pool: &CandidatePool,
    matching_config: &crate::config::MatchConfig,
) -> Vec<(String, Signal)> {
    pool.files
        .par_iter()
        .filter_map(|path| {
            match Signal::load(
                transcoder,
                path,
                Some(matching_config.candidate_duration_s),
                matching_config.analysis_sample_rate,
            ) {
                Ok(signal) => Some((path.display().to_string(), signal)),
                Err(e) => {
                    log::warn!("excluding candidate {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests;
