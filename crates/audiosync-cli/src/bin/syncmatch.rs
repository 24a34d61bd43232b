//! syncmatch - Match and sync one external audio file to a video
//!
//! Extracts the video's audio, cross-correlates it against every audio file
//! in a directory, and muxes the best match back into the video at the
//! estimated offset.
//!
//! Usage: syncmatch <video_file> <audio_dir> [--output <file>]

use anyhow::Result;
use audiosync_cli::output::print_json_result;
use audiosync_core::media::MediaTranscoder;
use audiosync_core::{FfmpegTranscoder, MatchConfig};
use clap::Parser;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "syncmatch")]
#[command(about = "Match and sync external audio to a video", long_about = None)]
struct Args {
    /// Video file to process
    video_file: String,

    /// Directory containing audio files to match
    audio_dir: String,

    /// Output video file (default: <video stem>_synced.mp4)
    #[arg(short, long)]
    output: Option<String>,

    /// Minimum correlation score to accept a match
    #[arg(short, long, default_value_t = 0.1)]
    threshold: f64,

    /// Report the match without writing any media
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Default: no logs (clean JSON output for parsing)
    // Verbose: show Info level logs for debugging
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    run_syncmatch(&args)
}

fn run_syncmatch(args: &Args) -> Result<()> {
    let video_path = Path::new(&args.video_file);
    let audio_dir = Path::new(&args.audio_dir);

    if !video_path.exists() {
        anyhow::bail!("Video file not found: {}", video_path.display());
    }
    if !audio_dir.exists() {
        anyhow::bail!("Audio directory not found: {}", audio_dir.display());
    }

    let config = MatchConfig::default();
    let transcoder = FfmpegTranscoder::default();

    let result = audiosync_core::find_best_match(video_path, audio_dir, &transcoder, &config)?;
    print_json_result(&result);

    let Some(candidate) = result.candidate.clone() else {
        anyhow::bail!("no matching audio found");
    };

    if !result.meets_threshold(args.threshold) {
        log::warn!(
            "score {:.4} is below threshold {}; match may not be reliable, not syncing",
            result.score,
            args.threshold
        );
        return Ok(());
    }
    if args.dry_run {
        log::info!("dry run, skipping sync");
        return Ok(());
    }

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = video_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video");
        format!("{stem}_synced.mp4")
    });

    log::info!("replacing audio, writing {}", output);
    transcoder.mux(
        video_path,
        Path::new(&candidate),
        result.offset_seconds,
        Path::new(&output),
    )?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "status": "success",
            "output_file": output,
        }))?
    );
    Ok(())
}
