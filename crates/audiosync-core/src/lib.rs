//! Audiosync Core - Audio/Video Alignment Library
//!
//! Matches independently recorded audio files against a video's embedded
//! track and estimates the time offset needed to align them, using waveform
//! cross-correlation or transcript similarity.

pub mod batch;
pub mod config;
pub mod correlate;
pub mod error;
pub mod matching;
pub mod media;
pub mod pool;
pub mod signal;
pub mod tags;
pub mod transcript;

pub use batch::{BatchReport, BatchRunner, ReferenceReport, SyncStatus};
pub use config::{BatchConfig, MatchConfig};
pub use correlate::{cross_correlate, CorrelationPeak};
pub use error::{Result, SyncError};
pub use matching::{MatchMethod, MatchResult};
pub use media::{FfmpegTranscoder, MediaTranscoder, Transcriber, WhisperTranscriber};
pub use pool::CandidatePool;
pub use signal::Signal;
pub use tags::{TagEntry, VideoTags};
pub use transcript::Transcript;

use std::path::Path;

/// Find the best-matching audio file for a single video by waveform
/// cross-correlation.
pub fn find_best_match(
    video_path: &Path,
    audio_dir: &Path,
    transcoder: &dyn MediaTranscoder,
    config: &MatchConfig,
) -> Result<MatchResult> {
    config.validate()?;

    let pool = CandidatePool::discover(audio_dir)?;
    log::info!(
        "found {} audio file(s) to compare in {}",
        pool.len(),
        audio_dir.display()
    );

    let reference = Signal::load(
        transcoder,
        video_path,
        Some(config.analysis_duration_s),
        config.analysis_sample_rate,
    )?;

    let candidates = batch::load_candidate_signals(transcoder, &pool, config);
    Ok(matching::rank_waveform(
        &video_path.display().to_string(),
        &reference,
        &candidates,
    ))
}
