//! Whisper-CLI-backed transcriber

use std::path::Path;
use std::process::Command;

use crate::error::{Result, SyncError};

use super::{FfmpegTranscoder, MediaTranscoder, Transcriber};

/// Whisper expects 16 kHz mono input
const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Transcriber that shells out to the `whisper` CLI
pub struct WhisperTranscriber {
    binary: String,
    model: String,
    language: String,
    extractor: FfmpegTranscoder,
}

impl WhisperTranscriber {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            binary: "whisper".to_string(),
            model: model.into(),
            language: "en".to_string(),
            extractor: FfmpegTranscoder::default(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for WhisperTranscriber {
    fn default() -> Self {
        Self::new("base")
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, path: &Path, duration: Option<f64>) -> Result<String> {
        // Bound the inference cost by extracting only the analysis prefix
        let wav_bytes = self.extractor.decode(path, duration, WHISPER_SAMPLE_RATE)?;

        let dir = tempfile::tempdir()?;
        let wav_path = dir.path().join("audio.wav");
        std::fs::write(&wav_path, &wav_bytes)?;

        let output = Command::new(&self.binary)
            .arg(&wav_path)
            .args(["--model", &self.model])
            .args(["--language", &self.language])
            .args(["--task", "transcribe"])
            .args(["--output_format", "txt"])
            .args(["--fp16", "False"])
            .arg("--output_dir")
            .arg(dir.path())
            .output()
            .map_err(|e| SyncError::Tool {
                tool: self.binary.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(SyncError::Transcribe {
                path: path.to_path_buf(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text_path = dir.path().join("audio.txt");
        let text = std::fs::read_to_string(&text_path).map_err(|_| SyncError::Transcribe {
            path: path.to_path_buf(),
            detail: "whisper produced no transcript".into(),
        })?;
        Ok(text.trim().to_string())
    }
}
