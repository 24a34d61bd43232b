//! Signal loading and normalization
//!
//! Turns the mono WAV stream produced by the external transcoder into a
//! floating-point signal in [-1, 1], ready for correlation.

use std::io::Cursor;
use std::path::Path;

use crate::error::{Result, SyncError};
use crate::media::MediaTranscoder;

/// A mono audio signal at a known sample rate
#[derive(Debug, Clone)]
pub struct Signal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Decode a bounded prefix of a media file through the transcoder.
    ///
    /// Failures mean "this file is unusable", never "abort the batch".
    pub fn load(
        transcoder: &dyn MediaTranscoder,
        path: &Path,
        duration: Option<f64>,
        sample_rate: u32,
    ) -> Result<Self> {
        let bytes = transcoder.decode(path, duration, sample_rate)?;
        let signal = Self::from_wav_bytes(&bytes).map_err(|e| SyncError::Decode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        if signal.is_empty() {
            return Err(SyncError::Decode {
                path: path.to_path_buf(),
                detail: "decoded stream contains no samples".into(),
            });
        }
        log::debug!(
            "{}: {} samples ({:.1}s) @ {}Hz",
            path.display(),
            signal.len(),
            signal.duration_s(),
            signal.sample_rate
        );
        Ok(signal)
    }

    fn from_wav_bytes(bytes: &[u8]) -> std::result::Result<Self, hound::Error> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<std::result::Result<_, _>>()?
            }
            hound::SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let samples = if spec.channels > 1 {
            downmix(&samples, spec.channels)
        } else {
            samples
        };

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }
}

/// Average interleaved channels down to mono
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let mut mono = Vec::with_capacity(samples.len() / channels as usize);
    for chunk in samples.chunks(channels as usize) {
        let avg: f32 = chunk.iter().sum::<f32>() / chunk.len() as f32;
        mono.push(avg);
    }
    mono
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_int_samples_normalize_to_unit_range() {
        let bytes = wav_bytes(&[0, 16384, -16384, 32767, -32768], 8000, 1);
        let signal = Signal::from_wav_bytes(&bytes).unwrap();

        assert_eq!(signal.sample_rate, 8000);
        assert_eq!(signal.len(), 5);
        assert!((signal.samples[0] - 0.0).abs() < 1e-6);
        assert!((signal.samples[1] - 0.5).abs() < 1e-6);
        assert!((signal.samples[2] + 0.5).abs() < 1e-6);
        assert!(signal.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_stereo_is_downmixed() {
        // left channel 0.5, right channel -0.5 -> silence
        let bytes = wav_bytes(&[16384, -16384, 16384, -16384], 8000, 2);
        let signal = Signal::from_wav_bytes(&bytes).unwrap();

        assert_eq!(signal.len(), 2);
        assert!(signal.samples.iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn test_duration_derives_from_rate() {
        let signal = Signal::new(vec![0.0; 16000], 8000);
        assert!((signal.duration_s() - 2.0).abs() < 1e-9);
    }
}
