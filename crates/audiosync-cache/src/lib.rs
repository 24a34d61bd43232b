//! Audiosync Cache - Durable Transcript Cache
//!
//! Persists expensive derived artifacts (speech transcripts) keyed by
//! method tag and source path, so repeated runs skip redundant
//! transcription work.

pub mod memo;
pub mod store;

pub use memo::TranscriptCache;
pub use store::{CacheEntry, CacheError};

use std::path::Path;

/// Build a cache key from a method tag and a source path.
///
/// The tag keeps artifacts derived under different methods apart (a video's
/// embedded track vs a standalone recording of the same event); the absolute
/// path keeps distinct files from colliding.
pub fn cache_key(tag: &str, path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    format!("{}:{}", tag, absolute.display())
}
