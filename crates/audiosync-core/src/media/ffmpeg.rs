//! ffmpeg-backed transcoder

use std::path::Path;
use std::process::Command;

use crate::error::{Result, SyncError};

use super::MediaTranscoder;

/// Transcoder that shells out to ffmpeg
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl MediaTranscoder for FfmpegTranscoder {
    fn decode(&self, path: &Path, duration: Option<f64>, sample_rate: u32) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(SyncError::NotFound(path.to_path_buf()));
        }

        let wav = tempfile::Builder::new()
            .prefix("audiosync")
            .suffix(".wav")
            .tempfile()?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-y")
            .args(["-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(path);
        if let Some(duration) = duration {
            cmd.arg("-t").arg(duration.to_string());
        }
        cmd.args(["-ac", "1", "-ar"])
            .arg(sample_rate.to_string())
            .args(["-f", "wav"])
            .arg(wav.path());

        let output = cmd.output().map_err(|e| SyncError::Tool {
            tool: self.binary.clone(),
            source: e,
        })?;
        if !output.status.success() {
            return Err(SyncError::Decode {
                path: path.to_path_buf(),
                detail: stderr_tail(&output.stderr),
            });
        }

        let bytes = std::fs::read(wav.path())?;
        if bytes.is_empty() {
            return Err(SyncError::Decode {
                path: path.to_path_buf(),
                detail: "ffmpeg produced no data".into(),
            });
        }
        Ok(bytes)
    }

    fn mux(&self, video: &Path, audio: &Path, offset_seconds: f64, output: &Path) -> Result<()> {
        let filter = offset_filter(offset_seconds);
        log::debug!(
            "muxing {} + {} (filter: {})",
            video.display(),
            audio.display(),
            filter
        );

        let result = Command::new(&self.binary)
            .arg("-y")
            .args(["-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "copy", "-af"])
            .arg(&filter)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-shortest"])
            .arg(output)
            .output()
            .map_err(|e| SyncError::Tool {
                tool: self.binary.clone(),
                source: e,
            })?;

        if !result.status.success() {
            return Err(SyncError::Mux {
                path: video.to_path_buf(),
                detail: stderr_tail(&result.stderr),
            });
        }
        Ok(())
    }
}

/// Audio filter aligning a candidate to the reference timeline: a candidate
/// that starts later is delayed, one that starts earlier has its head
/// trimmed.
fn offset_filter(offset_seconds: f64) -> String {
    if offset_seconds >= 0.0 {
        let ms = (offset_seconds * 1000.0).round() as i64;
        format!("adelay={ms}|{ms}")
    } else {
        format!("atrim=start={},asetpts=PTS-STARTPTS", -offset_seconds)
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let chars: Vec<char> = text.trim().chars().collect();
    let start = chars.len().saturating_sub(500);
    chars[start..].iter().collect()
}
