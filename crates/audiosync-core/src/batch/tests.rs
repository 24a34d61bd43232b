//! Tests for batch orchestration, using in-memory media tool fakes

use super::*;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const FOX: &str = "the quick brown fox jumps over the lazy dog";
const UNRELATED: &str = "completely unrelated content here";

struct FakeTranscriber {
    /// file name -> transcript; files not listed fail to transcribe
    texts: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeTranscriber {
    fn new(texts: &[(&str, &str)]) -> Self {
        Self {
            texts: texts
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transcriber for FakeTranscriber {
    fn transcribe(&self, path: &Path, _duration: Option<f64>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_str().unwrap();
        self.texts
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::Transcribe {
                path: path.to_path_buf(),
                detail: "unknown fixture".into(),
            })
    }
}

struct FakeTranscoder {
    /// file name -> samples served as WAV at the requested rate
    signals: HashMap<String, Vec<f32>>,
    mux_calls: AtomicUsize,
}

impl FakeTranscoder {
    fn new(signals: &[(&str, Vec<f32>)]) -> Self {
        Self {
            signals: signals
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            mux_calls: AtomicUsize::new(0),
        }
    }

    fn mux_calls(&self) -> usize {
        self.mux_calls.load(Ordering::SeqCst)
    }
}

impl MediaTranscoder for FakeTranscoder {
    fn decode(&self, path: &Path, _duration: Option<f64>, sample_rate: u32) -> Result<Vec<u8>> {
        let name = path.file_name().unwrap().to_str().unwrap();
        let samples = self.signals.get(name).ok_or_else(|| SyncError::Decode {
            path: path.to_path_buf(),
            detail: "unknown fixture".into(),
        })?;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample((s * 32767.0) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        Ok(cursor.into_inner())
    }

    fn mux(&self, _video: &Path, _audio: &Path, _offset: f64, _output: &Path) -> Result<()> {
        self.mux_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn tone(len: usize, sample_rate: u32) -> Vec<f32> {
    (0..len)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            (0.4 * (2.0 * PI * 440.0 * t).sin() + 0.2 * (2.0 * PI * 697.0 * t).sin()) as f32
        })
        .collect()
}

fn delayed(samples: &[f32], delay: usize) -> Vec<f32> {
    let mut out = vec![0.0; samples.len()];
    for n in delay..samples.len() {
        out[n] = samples[n - delay];
    }
    out
}

/// Tags file, video dir with processed renders, audio dir with candidates.
fn fixture(dir: &TempDir, videos: &[&str], candidates: &[&str]) -> BatchConfig {
    let tags: serde_json::Value = videos
        .iter()
        .map(|name| {
            (
                format!("{name}.mov"),
                serde_json::json!({ "path": format!("/events/Second Room/{name}.mov") }),
            )
        })
        .collect::<serde_json::Map<_, _>>()
        .into();
    let tags_file = dir.path().join("quadrant-tags.json");
    std::fs::write(&tags_file, serde_json::to_string_pretty(&tags).unwrap()).unwrap();

    let video_dir = dir.path().join("videos");
    std::fs::create_dir(&video_dir).unwrap();
    for name in videos {
        std::fs::write(video_dir.join(format!("{name}.mp4")), b"").unwrap();
    }

    let audio_dir = dir.path().join("audio");
    std::fs::create_dir(&audio_dir).unwrap();
    for name in candidates {
        std::fs::write(audio_dir.join(name), b"").unwrap();
    }

    BatchConfig {
        tags_file,
        audio_dir,
        video_dir,
        output_dir: dir.path().join("synced"),
        cache_file: dir.path().join("transcripts.json"),
        dry_run: true,
        ..BatchConfig::default()
    }
}

#[test]
fn test_transcript_batch_selects_matching_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(&dir, &["talk"], &["a.wav", "b.wav"]);

    let transcoder = FakeTranscoder::new(&[]);
    let transcriber =
        FakeTranscriber::new(&[("talk.mp4", FOX), ("a.wav", FOX), ("b.wav", UNRELATED)]);
    let cache = TranscriptCache::load(&config.cache_file).unwrap();

    let report = BatchRunner::new(&transcoder, &transcriber, &cache, &config)
        .run()
        .unwrap();

    assert_eq!(report.references.len(), 1);
    let reference = &report.references[0];
    assert_eq!(reference.status, SyncStatus::Skipped); // dry run
    let result = reference.result.as_ref().unwrap();
    assert!(result.candidate.as_deref().unwrap().ends_with("a.wav"));
    assert!((result.score - 1.0).abs() < 1e-12);
    assert_eq!(result.offset_seconds, 0.0);
}

#[test]
fn test_second_run_reuses_cached_transcripts() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(&dir, &["talk"], &["a.wav", "b.wav"]);

    let transcoder = FakeTranscoder::new(&[]);
    let transcriber =
        FakeTranscriber::new(&[("talk.mp4", FOX), ("a.wav", FOX), ("b.wav", UNRELATED)]);

    let cache = TranscriptCache::load(&config.cache_file).unwrap();
    BatchRunner::new(&transcoder, &transcriber, &cache, &config)
        .run()
        .unwrap();
    assert_eq!(transcriber.calls(), 3);

    // a fresh process: reload the cache from disk and run again
    let cache = TranscriptCache::load(&config.cache_file).unwrap();
    BatchRunner::new(&transcoder, &transcriber, &cache, &config)
        .run()
        .unwrap();
    assert_eq!(transcriber.calls(), 3, "cached keys must not re-transcribe");
}

#[test]
fn test_accepted_match_is_muxed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture(&dir, &["talk"], &["a.wav"]);
    config.dry_run = false;

    let transcoder = FakeTranscoder::new(&[]);
    let transcriber = FakeTranscriber::new(&[("talk.mp4", FOX), ("a.wav", FOX)]);
    let cache = TranscriptCache::load(&config.cache_file).unwrap();

    let report = BatchRunner::new(&transcoder, &transcriber, &cache, &config)
        .run()
        .unwrap();

    let reference = &report.references[0];
    assert_eq!(reference.status, SyncStatus::Synced);
    assert!(reference
        .output
        .as_ref()
        .unwrap()
        .ends_with("talk_synced.mp4"));
    assert_eq!(transcoder.mux_calls(), 1);
}

#[test]
fn test_no_winner_is_skipped_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture(&dir, &["talk"], &["b.wav"]);
    config.dry_run = false;

    let transcoder = FakeTranscoder::new(&[]);
    let transcriber = FakeTranscriber::new(&[("talk.mp4", FOX), ("b.wav", UNRELATED)]);
    let cache = TranscriptCache::load(&config.cache_file).unwrap();

    let report = BatchRunner::new(&transcoder, &transcriber, &cache, &config)
        .run()
        .unwrap();

    let reference = &report.references[0];
    assert_eq!(reference.status, SyncStatus::Skipped);
    assert!(reference.result.as_ref().unwrap().candidate.is_none());
    assert_eq!(transcoder.mux_calls(), 0);
}

#[test]
fn test_missing_video_fails_without_aborting_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(&dir, &["talk"], &["a.wav"]);

    // a second tagged video with no processed render on disk
    let mut tags: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.tags_file).unwrap()).unwrap();
    tags["absent.mov"] = serde_json::json!({ "path": "/events/Second Room/absent.mov" });
    std::fs::write(&config.tags_file, serde_json::to_string(&tags).unwrap()).unwrap();

    let transcoder = FakeTranscoder::new(&[]);
    let transcriber = FakeTranscriber::new(&[("talk.mp4", FOX), ("a.wav", FOX)]);
    let cache = TranscriptCache::load(&config.cache_file).unwrap();

    let report = BatchRunner::new(&transcoder, &transcriber, &cache, &config)
        .run()
        .unwrap();

    assert_eq!(report.references.len(), 2);
    assert_eq!(report.count(SyncStatus::Failed), 1);
    assert_eq!(report.count(SyncStatus::Skipped), 1);

    let failed = report
        .references
        .iter()
        .find(|r| r.reference == "absent.mov")
        .unwrap();
    assert!(failed.error.as_ref().unwrap().contains("not found"));
}

#[test]
fn test_failing_candidate_is_excluded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(&dir, &["talk"], &["a.wav", "broken.wav"]);

    let transcoder = FakeTranscoder::new(&[]);
    // broken.wav has no fixture text, so its transcription fails
    let transcriber = FakeTranscriber::new(&[("talk.mp4", FOX), ("a.wav", FOX)]);
    let cache = TranscriptCache::load(&config.cache_file).unwrap();

    let report = BatchRunner::new(&transcoder, &transcriber, &cache, &config)
        .run()
        .unwrap();

    let result = report.references[0].result.as_ref().unwrap();
    assert!(result.candidate.as_deref().unwrap().ends_with("a.wav"));
}

#[test]
fn test_waveform_batch_recovers_known_delay() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture(&dir, &["talk"], &["room.wav"]);
    config.dry_run = false;
    config.method = MatchMethod::Waveform;
    config.accept_threshold = 0.05;

    let sample_rate = config.matching.analysis_sample_rate;
    let base = tone(sample_rate as usize, sample_rate);
    let transcoder = FakeTranscoder::new(&[
        ("talk.mp4", delayed(&base, 400)),
        ("room.wav", base),
    ]);
    let transcriber = FakeTranscriber::new(&[]);
    let cache = TranscriptCache::load(&config.cache_file).unwrap();

    let report = BatchRunner::new(&transcoder, &transcriber, &cache, &config)
        .run()
        .unwrap();

    let reference = &report.references[0];
    assert_eq!(reference.status, SyncStatus::Synced);
    let result = reference.result.as_ref().unwrap();
    assert_eq!(result.method, MatchMethod::Waveform);
    assert!(
        (result.offset_seconds - 400.0 / sample_rate as f64).abs() < 1e-6,
        "offset was {}",
        result.offset_seconds
    );
    assert_eq!(transcoder.mux_calls(), 1);
}
