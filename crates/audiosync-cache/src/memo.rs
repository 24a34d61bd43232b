//! Single-flight memoization over the durable store
//!
//! Concurrent requests for the same key resolve to one computation; every
//! successful insert is flushed to disk immediately so a crash mid-batch
//! does not lose already-computed transcripts.

use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::store::{self, CacheEntry, CacheError, Entries};

/// In-memory transcript cache backed by a JSON file.
pub struct TranscriptCache {
    path: PathBuf,
    state: Mutex<State>,
    ready: Condvar,
}

struct State {
    entries: Entries,
    in_flight: HashSet<String>,
}

impl TranscriptCache {
    /// Load the cache from disk; a missing file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = store::load_entries(&path)?;
        log::debug!(
            "loaded {} cached transcript(s) from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path,
            state: Mutex::new(State {
                entries,
                in_flight: HashSet::new(),
            }),
            ready: Condvar::new(),
        })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.state.lock().entries.get(key).map(|e| e.text.clone())
    }

    /// Insert an entry and persist the store immediately.
    pub fn put(&self, key: impl Into<String>, text: impl Into<String>) -> Result<(), CacheError> {
        let mut state = self.state.lock();
        state.entries.insert(key.into(), CacheEntry::new(text));
        store::save_entries(&self.path, &state.entries)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value for `key`, or run `compute` to produce it.
    ///
    /// If another thread is already computing the same key, this blocks until
    /// that computation finishes instead of computing twice. A failed
    /// computation releases the key so a later caller may retry; nothing is
    /// cached for it.
    pub fn get_or_compute<E>(
        &self,
        key: &str,
        compute: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        {
            let mut state = self.state.lock();
            loop {
                if let Some(entry) = state.entries.get(key) {
                    return Ok(entry.text.clone());
                }
                if !state.in_flight.contains(key) {
                    break;
                }
                self.ready.wait(&mut state);
            }
            state.in_flight.insert(key.to_string());
        }

        let result = compute();

        let mut state = self.state.lock();
        state.in_flight.remove(key);
        if let Ok(text) = &result {
            state.entries.insert(key.to_string(), CacheEntry::new(text.clone()));
            if let Err(e) = store::save_entries(&self.path, &state.entries) {
                log::warn!("failed to persist cache {}: {}", self.path.display(), e);
            }
        }
        self.ready.notify_all();
        result
    }

    /// Write the current state back to disk.
    pub fn flush(&self) -> Result<(), CacheError> {
        let state = self.state.lock();
        store::save_entries(&self.path, &state.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_put_then_get_returns_stored_value() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranscriptCache::load(dir.path().join("cache.json")).unwrap();
        cache.put("audio:/a.wav", "hello world").unwrap();
        assert_eq!(cache.get("audio:/a.wav").as_deref(), Some("hello world"));
    }

    #[test]
    fn test_entries_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let first = TranscriptCache::load(&path).unwrap();
        first.put("video:/talk.mp4", "some speech").unwrap();
        drop(first);

        let second = TranscriptCache::load(&path).unwrap();
        assert_eq!(second.get("video:/talk.mp4").as_deref(), Some("some speech"));
    }

    #[test]
    fn test_get_or_compute_skips_compute_on_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranscriptCache::load(dir.path().join("cache.json")).unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let text = cache
                .get_or_compute("audio:/a.wav", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>("computed".to_string())
                })
                .unwrap();
            assert_eq!(text, "computed");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_single_flight_computes_once_under_contention() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranscriptCache::load(dir.path().join("cache.json")).unwrap();
        let calls = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let text = cache
                        .get_or_compute("audio:/shared.wav", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(50));
                            Ok::<_, std::io::Error>("shared".to_string())
                        })
                        .unwrap();
                    assert_eq!(text, "shared");
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranscriptCache::load(dir.path().join("cache.json")).unwrap();
        let calls = AtomicUsize::new(0);

        let failed = cache.get_or_compute("audio:/bad.wav", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        });
        assert!(failed.is_err());
        assert!(cache.get("audio:/bad.wav").is_none());

        let retried = cache.get_or_compute("audio:/bad.wav", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>("recovered".to_string())
        });
        assert_eq!(retried.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
