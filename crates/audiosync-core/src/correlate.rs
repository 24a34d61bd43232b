//! Waveform cross-correlation
//!
//! Estimates the lag between two signals via full linear cross-correlation,
//! computed as an FFT-based convolution of the reference with the reversed
//! candidate. The result is identical to direct correlation, just faster.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{Result, SyncError};
use crate::signal::Signal;

const NORM_EPSILON: f64 = 1e-10;

/// Best alignment found between a reference and a candidate signal
#[derive(Debug, Clone, Copy)]
pub struct CorrelationPeak {
    /// Positive: the candidate starts later than the reference and must be
    /// delayed by this many samples; negative: trimmed from its start.
    pub offset_samples: i64,
    /// Peak correlation magnitude divided by the reference length, which
    /// keeps the score comparable across candidates of different lengths.
    pub score: f64,
}

impl CorrelationPeak {
    pub fn offset_seconds(&self, sample_rate: u32) -> f64 {
        self.offset_samples as f64 / sample_rate as f64
    }
}

/// Cross-correlate two signals and locate the peak lag.
///
/// Both inputs must be non-empty; near-silent input is tolerated through an
/// epsilon guard in the normalization.
pub fn cross_correlate(reference: &Signal, candidate: &Signal) -> Result<CorrelationPeak> {
    let s1 = normalize(&reference.samples)?;
    let s2 = normalize(&candidate.samples)?;

    let full_len = s1.len() + s2.len() - 1;
    let fft_len = full_len.next_power_of_two();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    let mut a: Vec<Complex<f32>> = s1.iter().map(|&x| Complex::new(x, 0.0)).collect();
    a.resize(fft_len, Complex::new(0.0, 0.0));

    // Correlation is convolution with the time-reversed candidate
    let mut b: Vec<Complex<f32>> = s2.iter().rev().map(|&x| Complex::new(x, 0.0)).collect();
    b.resize(fft_len, Complex::new(0.0, 0.0));

    fft.process(&mut a);
    fft.process(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    ifft.process(&mut a);

    // rustfft leaves results unscaled
    let scale = 1.0 / fft_len as f32;

    let mut peak_idx = 0usize;
    let mut peak_value = f32::NEG_INFINITY;
    for (i, c) in a[..full_len].iter().enumerate() {
        let magnitude = (c.re * scale).abs();
        if magnitude > peak_value {
            peak_value = magnitude;
            peak_idx = i;
        }
    }

    let offset_samples = peak_idx as i64 - s2.len() as i64 + 1;
    let score = peak_value as f64 / s1.len() as f64;

    Ok(CorrelationPeak {
        offset_samples,
        score,
    })
}

/// Normalize to zero mean and unit variance.
fn normalize(samples: &[f32]) -> Result<Vec<f32>> {
    if samples.is_empty() {
        return Err(SyncError::EmptySignal);
    }

    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|&s| {
            let d = s as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt() + NORM_EPSILON;

    Ok(samples
        .iter()
        .map(|&s| ((s as f64 - mean) / std_dev) as f32)
        .collect())
}
