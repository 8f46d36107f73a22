// File: src/core/context.rs
use crate::core::tokenizer::{normalize_token, tokenize_strings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const MAX_PREDICTIONS: usize = 3;
pub const DEFAULT_MAX_CONTEXTS: usize = 20_000;

/// A follower must have been seen more than this many times before it is
/// offered as the second word of a phrase prediction.
const PHRASE_MIN_FREQUENCY: u32 = 2;

const FIELD_SEPARATOR: &str = "|||";
const RECORD_SEPARATOR: &str = ";;;";

const EN_INTERROGATIVES: [&str; 18] = [
    "what", "how", "when", "where", "why", "who", "which", "can", "could", "would", "should",
    "do", "does", "did", "is", "are", "was", "were",
];
const AR_INTERROGATIVES: [&str; 9] = ["ما", "ماذا", "كيف", "متى", "أين", "لماذا", "من", "هل", "كم"];
const CONJUNCTIONS: [&str; 10] = ["and", "but", "or", "so", "because", "since", "لكن", "أو", "لأن", "ثم"];
const EXCLAMATIONS: [&str; 9] = [
    "wow", "amazing", "great", "awesome", "fantastic", "excellent", "رائع", "ممتاز", "مذهل",
];

/// context -> (next token -> frequency)
type NGramTable = HashMap<String, HashMap<String, u32>>;

/// Bigram and trigram next-word statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextModel {
    bigrams: NGramTable,
    trigrams: NGramTable,
    max_contexts: usize,
}

impl ContextModel {
    pub fn new(max_contexts: usize) -> Self {
        Self {
            bigrams: HashMap::new(),
            trigrams: HashMap::new(),
            max_contexts: max_contexts.max(1),
        }
    }

    /// Tokenizes `sentence` and learns from the resulting sequence.
    pub fn learn_sentence(&mut self, sentence: &str) {
        let tokens = tokenize_strings(sentence);
        self.learn(&tokens);
    }

    /// Counts every adjacent pair and every two-token context followed by a
    /// third token. Sequences shorter than two tokens teach nothing.
    pub fn learn<S: AsRef<str>>(&mut self, tokens: &[S]) {
        let tokens: Vec<String> = tokens
            .iter()
            .map(|t| normalize_token(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() < 2 {
            return;
        }

        for pair in tokens.windows(2) {
            bump(&mut self.bigrams, pair[0].clone(), &pair[1]);
        }
        for triple in tokens.windows(3) {
            bump(&mut self.trigrams, format!("{} {}", triple[0], triple[1]), &triple[2]);
        }

        evict(&mut self.bigrams, self.max_contexts);
        evict(&mut self.trigrams, self.max_contexts);
    }

    /// Likely next tokens (or two-token phrases) after `context`.
    pub fn predict_next(&self, context: &str) -> Vec<String> {
        let words = tokenize_strings(context);
        let Some(last) = words.last() else {
            return vec![];
        };
        let mut predictions: Vec<String> = Vec::new();

        if words.len() >= 2 {
            let key = format!("{} {}", words[words.len() - 2], last);
            predictions = top_followers(&self.trigrams, &key, MAX_PREDICTIONS);
            for phrase in self.phrase_predictions(last, &predictions) {
                if !predictions.contains(&phrase) && predictions.len() < MAX_PREDICTIONS {
                    predictions.push(phrase);
                }
            }
        }

        for word in top_followers(&self.bigrams, last, MAX_PREDICTIONS) {
            if !predictions.contains(&word) {
                predictions.push(word);
            }
        }

        predictions.truncate(MAX_PREDICTIONS);
        predictions
    }

    fn phrase_predictions(&self, last: &str, predicted: &[String]) -> Vec<String> {
        predicted
            .iter()
            .filter_map(|next| {
                let followers = self.trigrams.get(&format!("{last} {next}"))?;
                let (best, freq) = best_follower(followers)?;
                (freq > PHRASE_MIN_FREQUENCY).then(|| format!("{next} {best}"))
            })
            .collect()
    }

    /// Rule-based punctuation hints; rules fire independently and results
    /// come back in rule order without duplicates.
    pub fn suggest_punctuation(&self, context: &str) -> Vec<String> {
        let trimmed = context.trim();
        if trimmed.is_empty() {
            return vec![];
        }
        let lower = trimmed.to_lowercase();
        let words: Vec<String> = lower
            .split_whitespace()
            .map(normalize_token)
            .collect();
        let word_count = words.len();
        let ends_with = |marks: &[char]| trimmed.ends_with(marks);
        let mut out: Vec<String> = Vec::new();
        let mut push = |mark: &str| {
            if !out.iter().any(|m| m == mark) {
                out.push(mark.to_string());
            }
        };

        if word_count >= 5 && !ends_with(&['.', '!', '?', '؟']) {
            push(".");
        }

        if let Some(first) = words.first() {
            if EN_INTERROGATIVES.contains(&first.as_str()) {
                push("?");
            } else if AR_INTERROGATIVES.contains(&first.as_str()) {
                push("؟");
            }
        }

        if (3..=7).contains(&word_count) && !ends_with(&[',', '.', '!', '?', '؟']) {
            let interior = &words[1..word_count - 1];
            if interior.iter().any(|w| CONJUNCTIONS.contains(&w.as_str())) {
                push(",");
            }
        }

        if words.iter().any(|w| EXCLAMATIONS.contains(&w.as_str())) {
            push("!");
        }

        out
    }

    /// Flat text encoding: `context|||next|||frequency` records joined by
    /// `;;;`, bigrams first, each table sorted.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for table in [&self.bigrams, &self.trigrams] {
            let mut contexts: Vec<&String> = table.keys().collect();
            contexts.sort();
            for context in contexts {
                let mut followers: Vec<(&String, &u32)> = table[context].iter().collect();
                followers.sort();
                for (next, freq) in followers {
                    if context.contains(FIELD_SEPARATOR)
                        || next.contains(FIELD_SEPARATOR)
                        || context.contains(RECORD_SEPARATOR)
                        || next.contains(RECORD_SEPARATOR)
                    {
                        continue;
                    }
                    out.push_str(context);
                    out.push_str(FIELD_SEPARATOR);
                    out.push_str(next);
                    out.push_str(FIELD_SEPARATOR);
                    out.push_str(&freq.to_string());
                    out.push_str(RECORD_SEPARATOR);
                }
            }
        }
        out
    }

    /// Replaces all in-memory state with the records in `data`. Malformed
    /// records are skipped.
    pub fn deserialize(&mut self, data: &str) {
        self.bigrams.clear();
        self.trigrams.clear();
        let mut skipped = 0usize;

        for record in data.split(RECORD_SEPARATOR) {
            if record.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
            let &[context, next, freq] = &parts[..] else {
                skipped += 1;
                continue;
            };
            let freq = match freq.trim().parse::<u32>() {
                Ok(f) if f > 0 => f,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            if context.is_empty() || next.is_empty() {
                skipped += 1;
                continue;
            }
            let table = if context.contains(' ') { &mut self.trigrams } else { &mut self.bigrams };
            table
                .entry(context.to_string())
                .or_default()
                .insert(next.to_string(), freq);
        }

        if skipped > 0 {
            debug!(skipped, "ignored malformed n-gram records");
        }
    }

    pub fn frequency(&self, context: &str, next: &str) -> u32 {
        let table = if context.contains(' ') { &self.trigrams } else { &self.bigrams };
        table
            .get(context)
            .and_then(|followers| followers.get(next))
            .copied()
            .unwrap_or(0)
    }

    pub fn bigram_count(&self) -> usize {
        self.bigrams.len()
    }

    pub fn trigram_count(&self) -> usize {
        self.trigrams.len()
    }

    pub fn clear(&mut self) {
        self.bigrams.clear();
        self.trigrams.clear();
    }
}

impl Default for ContextModel {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXTS)
    }
}

fn bump(table: &mut NGramTable, context: String, next: &str) {
    let count = table
        .entry(context)
        .or_default()
        .entry(next.to_string())
        .or_insert(0);
    *count = count.saturating_add(1);
}

/// Most frequent followers first; ties broken by text so output is stable.
fn top_followers(table: &NGramTable, context: &str, limit: usize) -> Vec<String> {
    let Some(followers) = table.get(context) else {
        return vec![];
    };
    let mut sorted: Vec<(&String, &u32)> = followers.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    sorted.into_iter().take(limit).map(|(w, _)| w.clone()).collect()
}

fn best_follower(followers: &HashMap<String, u32>) -> Option<(&String, u32)> {
    followers
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(w, f)| (w, *f))
}

/// Drops the contexts with the smallest total counts once `table` grows past
/// `capacity`, leaving it at 90% of capacity.
fn evict(table: &mut NGramTable, capacity: usize) {
    if table.len() <= capacity {
        return;
    }
    let target = capacity - capacity / 10;
    let mut totals: Vec<(String, u64)> = table
        .iter()
        .map(|(ctx, followers)| (ctx.clone(), followers.values().map(|&f| f as u64).sum()))
        .collect();
    totals.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)));
    let excess = table.len() - target;
    for (ctx, _) in totals.into_iter().take(excess) {
        table.remove(&ctx);
    }
    debug!(evicted = excess, remaining = table.len(), "evicted n-gram contexts");
}
