// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the UNIX epoch.
pub type Timestamp = u64;

pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

/// Where a word in the index came from. Ordered so that a stronger origin
/// is never replaced by a weaker one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WordOrigin {
    Bootstrap,
    Learned,
    UserDictionary,
}

/// A complete word stored in the index, together with its usage data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub text: String,
    pub frequency: u32,
    pub last_used_at: Timestamp,
    pub origin: WordOrigin,
}

/// Which pass produced a suggestion candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    Exact,
    Prefix,
    Typo,
    Context,
    Gesture,
    Prediction,
    /// Results from an external provider (calculator, clipboard, ...).
    Special,
}

impl CandidateSource {
    /// Classifies a candidate against what the user has typed so far.
    pub fn classify(candidate: &str, current_word: &str, max_edit_distance: usize) -> Self {
        if current_word.is_empty() {
            return CandidateSource::Prediction;
        }
        let candidate = candidate.to_lowercase();
        let current = current_word.to_lowercase();
        if candidate == current {
            CandidateSource::Exact
        } else if candidate.starts_with(&current) {
            CandidateSource::Prefix
        } else if crate::fuzzy::typo::edit_distance(&candidate, &current) <= max_edit_distance {
            CandidateSource::Typo
        } else {
            CandidateSource::Context
        }
    }
}

/// A transient, scored suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub score: f64,
    pub source: CandidateSource,
}

impl Candidate {
    pub fn new(text: impl Into<String>, source: CandidateSource) -> Self {
        Self {
            text: text.into(),
            score: 0.0,
            source,
        }
    }
}
