//! Error taxonomy for the alignment engine
//!
//! Every variant is local to the file it names: the batch orchestrator
//! records the failure and moves on, it never aborts the run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to decode {path}: {detail}")]
    Decode { path: PathBuf, detail: String },

    #[error("failed to transcribe {path}: {detail}")]
    Transcribe { path: PathBuf, detail: String },

    #[error("failed to mux {path}: {detail}")]
    Mux { path: PathBuf, detail: String },

    #[error("cannot correlate an empty signal")]
    EmptySignal,

    #[error("failed to run {tool}: {source}")]
    Tool {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
