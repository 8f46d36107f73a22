// File: src/core/ranker.rs
use crate::core::types::{Candidate, CandidateSource, Timestamp};
use crate::fuzzy::typo::{edit_distance, DEFAULT_MAX_EDIT_DISTANCE};
use std::collections::HashMap;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RankingWeights {
    pub exact_match: f64,
    pub prefix_match: f64,
    pub typo_tolerance: f64,
    pub frequency: f64,
    pub context: f64,
    pub recent_usage: f64,
    pub length_preference: f64,
    pub max_edit_distance: usize,
    pub recency_decay_days: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            exact_match: 100.0,
            prefix_match: 50.0,
            typo_tolerance: 30.0,
            frequency: 40.0,
            context: 35.0,
            recent_usage: 25.0,
            length_preference: 10.0,
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
            recency_decay_days: 30.0,
        }
    }
}

/// Everything a ranking pass depends on. Two passes over the same context
/// and candidates produce the same order.
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    pub current_word: &'a str,
    pub previous_context: &'a str,
    pub frequencies: &'a HashMap<String, u32>,
    pub recency: &'a HashMap<String, Timestamp>,
    pub now: Timestamp,
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionRanker {
    weights: RankingWeights,
}

impl SuggestionRanker {
    pub fn new(weights: RankingWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    pub fn score(&self, candidate: &str, ctx: &RankingContext<'_>) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;
        let key = candidate.to_lowercase();

        if !ctx.current_word.is_empty() {
            let current = ctx.current_word.to_lowercase();
            if key == current {
                score += w.exact_match;
            } else if key.starts_with(&current) {
                let completion = current.chars().count() as f64 / key.chars().count() as f64;
                score += w.prefix_match + w.prefix_match * completion * 0.5;
            } else {
                let distance = edit_distance(&key, &current);
                if distance <= w.max_edit_distance && w.max_edit_distance > 0 {
                    score += w.typo_tolerance * (1.0 - distance as f64 / w.max_edit_distance as f64);
                }
            }
        }

        if let Some(&freq) = ctx.frequencies.get(&key) {
            // ln keeps very common words from drowning everything else out.
            score += w.frequency * (freq as f64 + 1.0).ln();
        }

        if !ctx.previous_context.trim().is_empty() {
            score += w.context * context_fit(&key, ctx.previous_context);
        }

        if let Some(&last_used) = ctx.recency.get(&key) {
            let age = ctx.now.saturating_sub(last_used) as f64;
            score += w.recent_usage * (-age / (w.recency_decay_days * MILLIS_PER_DAY)).exp();
        }

        if (3..=7).contains(&candidate.chars().count()) {
            score += w.length_preference;
        }

        score
    }

    /// Scores every candidate and sorts best first. Equal scores keep their
    /// input order.
    pub fn rank_candidates(&self, candidates: Vec<Candidate>, ctx: &RankingContext<'_>) -> Vec<Candidate> {
        let mut scored: Vec<Candidate> = candidates
            .into_iter()
            .map(|mut c| {
                c.score = self.score(&c.text, ctx);
                c
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    pub fn rank<S: AsRef<str>>(&self, candidates: &[S], ctx: &RankingContext<'_>) -> Vec<String> {
        let candidates = candidates
            .iter()
            .map(|c| {
                let text = c.as_ref();
                let source = CandidateSource::classify(text, ctx.current_word, self.weights.max_edit_distance);
                Candidate::new(text, source)
            })
            .collect();
        self.rank_candidates(candidates, ctx)
            .into_iter()
            .map(|c| c.text)
            .collect()
    }
}

/// 1.0 for the most likely follower of the last context word, dropping by
/// 0.1 per rank, 0.0 when not listed.
fn context_fit(candidate: &str, previous_context: &str) -> f64 {
    let Some(last) = previous_context.split_whitespace().last() else {
        return 0.0;
    };
    common_followers(&last.to_lowercase())
        .iter()
        .position(|f| f.to_lowercase() == candidate)
        .map_or(0.0, |i| 1.0 - i as f64 * 0.1)
}

fn common_followers(word: &str) -> &'static [&'static str] {
    match word {
        "i" => &["am", "have", "will", "can", "don't"],
        "you" => &["are", "have", "can", "will", "don't"],
        "the" => &["best", "first", "last", "most", "only"],
        "to" => &["be", "do", "go", "get", "see"],
        "have" => &["a", "to", "been", "had", "not"],
        "will" => &["be", "have", "not", "go", "do"],
        "can" => &["be", "you", "i", "we", "not"],
        "أنا" => &["أريد", "أحب", "لا", "سوف", "كنت"],
        "هذا" => &["هو", "ما", "كان", "يعني", "جيد"],
        "في" => &["البيت", "المدرسة", "الصباح", "المساء", "الوقت"],
        "من" => &["فضلك", "هنا", "هناك", "الآن", "البداية"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        current_word: &'a str,
        previous_context: &'a str,
        frequencies: &'a HashMap<String, u32>,
        recency: &'a HashMap<String, Timestamp>,
    ) -> RankingContext<'a> {
        RankingContext { current_word, previous_context, frequencies, recency, now: 1_000_000 }
    }

    #[test]
    fn exact_beats_prefix_beats_typo() {
        let (f, r) = (HashMap::new(), HashMap::new());
        let ranker = SuggestionRanker::default();
        let ranked = ranker.rank(&["helo", "hello", "help"], &ctx("help", "", &f, &r));
        assert_eq!(ranked, vec!["help", "helo", "hello"]);
    }

    #[test]
    fn shorter_completion_scores_higher() {
        let (f, r) = (HashMap::new(), HashMap::new());
        let ranker = SuggestionRanker::default();
        let c = ctx("wor", "", &f, &r);
        assert!(ranker.score("word", &c) > ranker.score("worldwide", &c));
    }

    #[test]
    fn frequency_is_log_scaled() {
        let mut f = HashMap::new();
        f.insert("apple".to_string(), 1000);
        f.insert("apply".to_string(), 10);
        let r = HashMap::new();
        let ranker = SuggestionRanker::default();
        let c = ctx("app", "", &f, &r);
        let gap = ranker.score("apple", &c) - ranker.score("apply", &c);
        let expected = 40.0 * ((1001.0f64).ln() - (11.0f64).ln());
        assert!((gap - expected).abs() < 1e-9);
    }

    #[test]
    fn context_followers_lift_candidates() {
        let (f, r) = (HashMap::new(), HashMap::new());
        let ranker = SuggestionRanker::default();
        let ranked = ranker.rank(&["will", "have", "am"], &ctx("", "yesterday I", &f, &r));
        assert_eq!(ranked, vec!["have", "will", "am"]);
    }

    #[test]
    fn recent_words_decay() {
        let f = HashMap::new();
        let mut r = HashMap::new();
        r.insert("fresh".to_string(), 1_000_000);
        r.insert("stale".to_string(), 0);
        let ranker = SuggestionRanker::default();
        let c = ctx("", "", &f, &r);
        assert!(ranker.score("fresh", &c) > ranker.score("stale", &c));
        assert!((ranker.score("fresh", &c) - (25.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_input_order_and_repeat_identically() {
        let (f, r) = (HashMap::new(), HashMap::new());
        let ranker = SuggestionRanker::default();
        let c = ctx("", "", &f, &r);
        let candidates = ["delta", "alpha", "gamma", "beta"];
        let first = ranker.rank(&candidates, &c);
        assert_eq!(first, vec!["delta", "alpha", "gamma", "beta"]);
        assert_eq!(ranker.rank(&candidates, &c), first);
    }
}
