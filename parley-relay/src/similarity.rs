//! Duplicate suppression for incoming transcripts.
//!
//! Speech recognition can deliver the same utterance twice, and the
//! microphone can pick up the assistant's own synthesized voice. Both show up
//! as a transcript that closely matches the previous reply. The gate compares
//! each transcript against the session's last reply and drops near-copies.

/// Normalized Levenshtein similarity of two strings, ignoring case.
///
/// `(max_len - distance) / max_len`, measured in characters. Two empty
/// strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(&a, &b);
    (max_len - distance) as f64 / max_len as f64
}

/// Outcome of running a transcript through the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Pass { score: f64 },
    Drop { score: f64 },
}

impl GateDecision {
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    pub const fn score(&self) -> f64 {
        match self {
            Self::Pass { score } | Self::Drop { score } => *score,
        }
    }
}

/// Drops transcripts whose similarity to the last reply exceeds a threshold.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityGate {
    threshold: f64,
}

impl SimilarityGate {
    pub const DEFAULT_THRESHOLD: f64 = 0.8;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score `new_text` against `last_reply`. Scores equal to the threshold pass.
    pub fn evaluate(&self, new_text: &str, last_reply: &str) -> GateDecision {
        let score = similarity(new_text, last_reply);
        if score > self.threshold {
            GateDecision::Drop { score }
        } else {
            GateDecision::Pass { score }
        }
    }
}

impl Default for SimilarityGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}
