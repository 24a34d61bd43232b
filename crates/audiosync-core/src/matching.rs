//! Candidate ranking and match results
//!
//! Runs a matcher across a candidate pool for one reference and keeps the
//! single best result. Scores from different methods are not calibrated
//! against each other; a result always carries the method that produced it.

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::correlate;
use crate::signal::Signal;
use crate::transcript::{self, Transcript};


/// Matching strategy used to produce a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Waveform,
    Transcript,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Waveform => "waveform",
            MatchMethod::Transcript => "transcript",
        }
    }
}

/// Outcome of ranking a candidate pool against one reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// Identifier of the reference (video)
    pub reference: String,
    /// Winning candidate, or `None` if the pool was empty or unusable
    pub candidate: Option<String>,
    /// Positive: the candidate starts later than the reference and must be
    /// delayed; negative: it starts earlier and is trimmed.
    pub offset_seconds: f64,
    /// Confidence in [0, 1]; scale depends on the method
    pub score: f64,
    pub method: MatchMethod,
}

impl MatchResult {
    pub fn no_match(reference: impl Into<String>, method: MatchMethod) -> Self {
        Self {
            reference: reference.into(),
            candidate: None,
            offset_seconds: 0.0,
            score: 0.0,
            method,
        }
    }

    /// Whether the result is eligible to trigger a synced output.
    ///
    /// Below-threshold winners are still reported, they just never sync.
    pub fn meets_threshold(&self, threshold: f64) -> bool {
        self.candidate.is_some() && self.score >= threshold
    }
}

/// Rank candidates against a reference signal by cross-correlation.
///
/// Candidates that fail to correlate are excluded; ties keep the first
/// candidate seen.
pub fn rank_waveform(
    reference_id: &str,
    reference: &Signal,
    candidates: &[(String, Signal)],
) -> MatchResult {
    let mut result = MatchResult::no_match(reference_id, MatchMethod::Waveform);
    let mut best_score = 0.0f64;

    for (id, signal) in candidates {
        let peak = match correlate::cross_correlate(reference, signal) {
            Ok(peak) => peak,
            Err(e) => {
                log::warn!("excluding {}: {}", id, e);
                continue;
            }
        };
        log::debug!(
            "{}: score={:.4}, offset={:+.2}s",
            id,
            peak.score,
            peak.offset_seconds(reference.sample_rate)
        );

        if peak.score > best_score {
            best_score = peak.score;
            result.candidate = Some(id.clone());
            result.offset_seconds = peak.offset_seconds(reference.sample_rate);
            result.score = peak.score.clamp(0.0, 1.0);
        }
    }

    result
}

/// Rank candidates against a reference transcript by text similarity.
pub fn rank_transcript(
    reference_id: &str,
    reference: &Transcript,
    candidates: &[(String, Transcript)],
    config: &MatchConfig,
) -> MatchResult {
    let mut result = MatchResult::no_match(reference_id, MatchMethod::Transcript);
    let mut best_score = 0.0f64;

    for (id, candidate) in candidates {
        let score = transcript::similarity(reference, candidate);
        log::debug!("{}: score={:.4}", id, score);

        if score > best_score {
            best_score = score;
            result.candidate = Some(id.clone());
            result.score = score.clamp(0.0, 1.0);
            result.offset_seconds = transcript::estimate_offset(reference, candidate, config);
        }
    }

    result
}
