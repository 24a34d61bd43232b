//! Configuration for the alignment engine
//!
//! All tunables are explicit values passed into the matchers and the batch
//! orchestrator; there is no process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::matching::MatchMethod;

/// Algorithm parameters shared by both matchers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Seconds of reference audio analyzed for matching
    #[serde(default = "default_analysis_duration_s")]
    pub analysis_duration_s: f64,
    /// Seconds of candidate audio analyzed (candidates are given a wider
    /// window so the reference prefix can land anywhere inside it)
    #[serde(default = "default_candidate_duration_s")]
    pub candidate_duration_s: f64,
    /// Sample rate for waveform analysis; lower is faster but less accurate
    #[serde(default = "default_analysis_sample_rate")]
    pub analysis_sample_rate: u32,

    /// Seconds of audio transcribed for text matching
    #[serde(default = "default_transcribe_duration_s")]
    pub transcribe_duration_s: f64,
    /// Number of leading reference words used as the sliding query window
    #[serde(default = "default_query_window_words")]
    pub query_window_words: usize,
    /// Assumed speaking rate for converting word positions to seconds
    #[serde(default = "default_words_per_second")]
    pub words_per_second: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            analysis_duration_s: default_analysis_duration_s(),
            candidate_duration_s: default_candidate_duration_s(),
            analysis_sample_rate: default_analysis_sample_rate(),

            transcribe_duration_s: default_transcribe_duration_s(),
            query_window_words: default_query_window_words(),
            words_per_second: default_words_per_second(),
        }
    }
}

fn default_analysis_duration_s() -> f64 {
    60.0
}
fn default_candidate_duration_s() -> f64 {
    120.0
}
fn default_analysis_sample_rate() -> u32 {
    8000
}
fn default_transcribe_duration_s() -> f64 {
    120.0
}
fn default_query_window_words() -> usize {
    50
}
fn default_words_per_second() -> f64 {
    2.5
}

impl MatchConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.analysis_sample_rate == 0 {
            return Err(SyncError::Config("analysis_sample_rate must be > 0".into()));
        }
        if self.analysis_duration_s <= 0.0 || self.candidate_duration_s <= 0.0 {
            return Err(SyncError::Config("analysis durations must be > 0".into()));
        }
        if self.transcribe_duration_s <= 0.0 {
            return Err(SyncError::Config("transcribe_duration_s must be > 0".into()));
        }
        if self.query_window_words == 0 {
            return Err(SyncError::Config("query_window_words must be > 0".into()));
        }
        if self.words_per_second <= 0.0 {
            return Err(SyncError::Config("words_per_second must be > 0".into()));
        }
        Ok(())
    }
}

/// Batch run configuration, loadable from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// JSON file mapping video names to tag entries
    #[serde(default = "default_tags_file")]
    pub tags_file: PathBuf,
    /// Directory searched recursively for candidate audio files
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    /// Directory holding the processed reference videos
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,
    /// Directory where synced videos are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Durable transcript cache location
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Substring a tag entry's source path must contain to count as a
    /// reference; empty selects every tagged video
    #[serde(default)]
    pub path_filter: String,
    /// Matching strategy for the run
    #[serde(default = "default_method")]
    pub method: MatchMethod,
    /// Minimum score a winner needs before a synced output is produced
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f64,
    /// Report matches without touching any media
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub matching: MatchConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            tags_file: default_tags_file(),
            audio_dir: default_audio_dir(),
            video_dir: default_video_dir(),
            output_dir: default_output_dir(),
            cache_file: default_cache_file(),
            path_filter: String::new(),
            method: default_method(),
            accept_threshold: default_accept_threshold(),
            dry_run: false,
            matching: MatchConfig::default(),
        }
    }
}

fn default_tags_file() -> PathBuf {
    PathBuf::from("quadrant-tags.json")
}
fn default_audio_dir() -> PathBuf {
    PathBuf::from("audio")
}
fn default_video_dir() -> PathBuf {
    PathBuf::from("videos")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("synced")
}
fn default_cache_file() -> PathBuf {
    PathBuf::from("transcripts.json")
}
fn default_method() -> MatchMethod {
    MatchMethod::Transcript
}
fn default_accept_threshold() -> f64 {
    0.3
}

impl BatchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: BatchConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
