//! syncbatch - Match a pool of audio recordings against tagged videos
//!
//! Reads the tag file, evaluates every reference video against the candidate
//! pool with the configured matcher, syncs accepted winners, and prints an
//! end-of-run summary. Transcripts are cached on disk so repeated runs skip
//! the expensive transcription step.
//!
//! Usage:
//!   syncbatch                         # uses defaults / syncbatch.toml
//!   syncbatch --config <path>         # explicit config file
//!   syncbatch --method waveform --dry-run

use anyhow::Result;
use audiosync_cache::TranscriptCache;
use audiosync_cli::output::{print_json_report, print_summary};
use audiosync_core::{BatchConfig, BatchRunner, FfmpegTranscoder, MatchMethod, WhisperTranscriber};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "syncbatch")]
#[command(about = "Match and sync a pool of recordings against tagged videos", long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Tags file mapping video names to their source paths
    #[arg(long)]
    tags: Option<PathBuf>,

    /// Directory containing candidate audio files
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Directory containing the processed reference videos
    #[arg(long)]
    video_dir: Option<PathBuf>,

    /// Directory for synced output videos
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Transcript cache file
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Only consider tagged videos whose path contains this substring
    #[arg(long)]
    filter: Option<String>,

    /// Matching method: "transcript" or "waveform"
    #[arg(long)]
    method: Option<String>,

    /// Minimum score required to sync a match
    #[arg(long)]
    threshold: Option<f64>,

    /// Whisper model for transcription (tiny/base/small/medium/large)
    #[arg(long, default_value = "base")]
    model: String,

    /// Only show matches, don't touch any media
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Default: progress at info level; verbose adds per-candidate detail
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = build_config(&args)?;
    run_syncbatch(&args, config)
}

fn build_config(args: &Args) -> Result<BatchConfig> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::load(Path::new(path))?,
        None => BatchConfig::default(),
    };

    if let Some(tags) = &args.tags {
        config.tags_file = tags.clone();
    }
    if let Some(audio_dir) = &args.audio_dir {
        config.audio_dir = audio_dir.clone();
    }
    if let Some(video_dir) = &args.video_dir {
        config.video_dir = video_dir.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(cache) = &args.cache {
        config.cache_file = cache.clone();
    }
    if let Some(filter) = &args.filter {
        config.path_filter = filter.clone();
    }
    if let Some(method) = &args.method {
        config.method = match method.as_str() {
            "transcript" => MatchMethod::Transcript,
            "waveform" => MatchMethod::Waveform,
            other => anyhow::bail!("unknown method {:?} (use transcript or waveform)", other),
        };
    }
    if let Some(threshold) = args.threshold {
        config.accept_threshold = threshold;
    }
    if args.dry_run {
        config.dry_run = true;
    }

    Ok(config)
}

fn run_syncbatch(args: &Args, config: BatchConfig) -> Result<()> {
    let transcoder = FfmpegTranscoder::default();
    let transcriber = WhisperTranscriber::new(args.model.clone());
    let cache = TranscriptCache::load(&config.cache_file)?;

    let runner = BatchRunner::new(&transcoder, &transcriber, &cache, &config);
    let report = runner.run()?;
    cache.flush()?;

    if args.json {
        print_json_report(&report);
    } else {
        print_summary(&report);
    }
    Ok(())
}
