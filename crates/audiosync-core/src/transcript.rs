//! Transcript-based fuzzy matching
//!
//! Fallback matcher for when waveform correlation is unavailable or
//! unreliable: compares recognized speech as lowercase token sequences using
//! a Ratcliff/Obershelp sequence-matching ratio, and estimates a coarse time
//! offset from word positions at an assumed speaking rate.

use std::collections::HashMap;

use crate::config::MatchConfig;

/// Recognized speech plus the duration of audio analyzed to produce it
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub analyzed_s: f64,
}

impl Transcript {
    pub fn new(text: impl Into<String>, analyzed_s: f64) -> Self {
        Self {
            text: text.into(),
            analyzed_s,
        }
    }

    pub fn tokens(&self) -> Vec<String> {
        self.text
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.text.split_whitespace().next().is_none()
    }
}

/// Similarity ratio between two transcripts, in [0, 1].
pub fn similarity(a: &Transcript, b: &Transcript) -> f64 {
    similarity_tokens(&a.tokens(), &b.tokens())
}

/// Ratcliff/Obershelp ratio `2*M / T` over token sequences, where `M` is the
/// total length of matching blocks and `T` the combined sequence length.
pub fn similarity_tokens<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let matched = matching_tokens(a, b, 0, a.len(), 0, b.len());
    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

/// Estimate the offset aligning a candidate to a reference, in seconds.
///
/// Slides the first `query_window_words` reference tokens over the candidate
/// and converts the best-matching word position to seconds. A match `p` words
/// into the candidate means the candidate recording started earlier than the
/// reference, so the returned offset is negative (trim) per the waveform sign
/// convention.
pub fn estimate_offset(reference: &Transcript, candidate: &Transcript, config: &MatchConfig) -> f64 {
    let ref_tokens = reference.tokens();
    let cand_tokens = candidate.tokens();
    if ref_tokens.is_empty() || cand_tokens.is_empty() {
        return 0.0;
    }

    let window = &ref_tokens[..ref_tokens.len().min(config.query_window_words)];
    if cand_tokens.len() < window.len() {
        return 0.0;
    }

    let mut best_pos = 0usize;
    let mut best_score = 0.0f64;
    for pos in 0..=(cand_tokens.len() - window.len()) {
        let score = similarity_tokens(window, &cand_tokens[pos..pos + window.len()]);
        if score > best_score {
            best_score = score;
            best_pos = pos;
        }
    }
    if best_pos == 0 {
        return 0.0;
    }

    -(best_pos as f64 / config.words_per_second)
}

/// Total matched tokens: longest common block, then recurse on both sides.
fn matching_tokens<S: AsRef<str>>(
    a: &[S],
    b: &[S],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> usize {
    let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
    if size == 0 {
        return 0;
    }
    size + matching_tokens(a, b, alo, i, blo, j)
        + matching_tokens(a, b, i + size, ahi, j + size, bhi)
}

/// Longest contiguous matching block within the given ranges.
fn longest_match<S: AsRef<str>>(
    a: &[S],
    b: &[S],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut b2j: HashMap<&str, Vec<usize>> = HashMap::new();
    for (j, token) in b.iter().enumerate().take(bhi).skip(blo) {
        b2j.entry(token.as_ref()).or_default().push(j);
    }

    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, token) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut row: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(token.as_ref()) {
            for &j in positions {
                let size = if j > blo {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                row.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        j2len = row;
    }

    (best_i, best_j, best_size)
}
