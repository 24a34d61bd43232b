//! Candidate pool discovery

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, SyncError};

/// Audio file extensions considered candidate recordings
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "aac", "flac", "ogg"];

/// The set of candidate audio files for a batch run, built once and shared
/// across every reference.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub files: Vec<PathBuf>,
}

impl CandidatePool {
    /// Recursively collect audio files under `dir`, sorted for deterministic
    /// iteration order.
    pub fn discover(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(SyncError::NotFound(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_audio_file(path))
            .collect();
        files.sort();

        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
