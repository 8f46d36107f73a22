// File: src/learning.rs
use crate::core::tokenizer::{is_learnable_word, learnable_words, normalize, tokenize_strings};
use crate::core::types::{Timestamp, WordEntry, WordOrigin};
use crate::core::{context::ContextModel, trie::WordIndex};
use std::collections::HashMap;

/// Per-word usage counts and last-use times fed to the ranker.
#[derive(Debug, Clone, Default)]
pub struct UsageStats {
    pub frequencies: HashMap<String, u32>,
    pub recency: HashMap<String, Timestamp>,
}

impl UsageStats {
    fn bump(&mut self, word: &str, amount: u32, at: Timestamp) {
        let freq = self.frequencies.entry(word.to_string()).or_insert(0);
        *freq = freq.saturating_add(amount);
        let last = self.recency.entry(word.to_string()).or_insert(0);
        *last = (*last).max(at);
    }

    pub fn forget(&mut self, word: &str) {
        self.frequencies.remove(word);
        self.recency.remove(word);
    }

    /// Seeds the tables from persisted entries of learned or user words.
    pub fn absorb(&mut self, entries: &[WordEntry]) {
        for entry in entries.iter().filter(|e| e.origin != WordOrigin::Bootstrap) {
            self.frequencies.insert(entry.text.clone(), entry.frequency);
            self.recency.insert(entry.text.clone(), entry.last_used_at);
        }
    }
}

/// Applies completed input to the word index, the context model and the
/// ranker's usage tables.
pub struct LearningEngine {
    frequency_increment: u32,
    user_dictionary_boost: u32,
}

impl LearningEngine {
    pub fn new(user_dictionary_boost: u32) -> Self {
        Self { frequency_increment: 1, user_dictionary_boost }
    }

    /// Learns every valid word of `text` and the sequence as context.
    /// Returns the number of words learned; text without a single valid
    /// word teaches nothing.
    pub fn learn_text(
        &self,
        index: &mut WordIndex,
        context_model: &mut ContextModel,
        usage: &mut UsageStats,
        text: &str,
        at: Timestamp,
    ) -> usize {
        let words = learnable_words(text);
        if words.is_empty() {
            return 0;
        }
        context_model.learn(&tokenize_strings(text));
        for word in &words {
            self.record(index, usage, word, at);
        }
        words.len()
    }

    /// Learns the words of a single committed chunk. Surrounding punctuation
    /// is stripped and a multi-word chunk is split, so `"Hello!"` teaches
    /// `hello`. Returns false if nothing passed the validity filter.
    pub fn learn_word(&self, index: &mut WordIndex, usage: &mut UsageStats, word: &str, at: Timestamp) -> bool {
        let words = learnable_words(word);
        for word in &words {
            self.record(index, usage, word, at);
        }
        !words.is_empty()
    }

    fn record(&self, index: &mut WordIndex, usage: &mut UsageStats, word: &str, at: Timestamp) {
        index.insert_with(word, WordOrigin::Learned, self.frequency_increment, at);
        usage.bump(word, self.frequency_increment, at);
    }

    /// One-time boost that puts `word` ahead of organically learned words.
    pub fn promote(&self, index: &mut WordIndex, usage: &mut UsageStats, word: &str, at: Timestamp) -> bool {
        let word = normalize(word);
        if !is_learnable_word(&word) {
            return false;
        }
        index.insert_with(&word, WordOrigin::UserDictionary, self.user_dictionary_boost, at);
        usage.bump(&word, self.user_dictionary_boost, at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_feeds_index_model_and_usage() {
        let engine = LearningEngine::new(100);
        let mut index = WordIndex::new();
        let mut model = ContextModel::default();
        let mut usage = UsageStats::default();

        let learned = engine.learn_text(&mut index, &mut model, &mut usage, "Nice to meet you!", 10);
        assert_eq!(learned, 4);
        assert!(index.contains("meet"));
        assert_eq!(model.frequency("meet", "you"), 1);
        assert_eq!(model.frequency("you", "!"), 1);
        assert_eq!(usage.frequencies.get("nice"), Some(&1));
        assert_eq!(usage.recency.get("nice"), Some(&10));
        assert!(!index.contains("!"));
    }

    #[test]
    fn invalid_words_are_rejected() {
        let engine = LearningEngine::new(100);
        let mut index = WordIndex::new();
        let mut usage = UsageStats::default();
        assert!(!engine.learn_word(&mut index, &mut usage, "?!", 1));
        assert!(!engine.learn_word(&mut index, &mut usage, "2024", 1));
        assert!(engine.learn_word(&mut index, &mut usage, "a", 1));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn committed_chunks_are_tokenized() {
        let engine = LearningEngine::new(100);
        let mut index = WordIndex::new();
        let mut usage = UsageStats::default();
        assert!(engine.learn_word(&mut index, &mut usage, "Hello!", 1));
        assert!(index.contains("hello"));
        assert!(!index.contains("hello!"));

        assert!(engine.learn_word(&mut index, &mut usage, "good morning", 1));
        assert!(index.contains("good"));
        assert!(index.contains("morning"));
        assert!(!index.contains("good morning"));

        assert!(engine.learn_word(&mut index, &mut usage, "\"quoted\"", 1));
        assert!(index.contains("quoted"));
        assert!(!index.contains("\"quoted\""));
        assert_eq!(index.len(), 4);
        assert_eq!(usage.frequencies.get("hello"), Some(&1));
    }

    #[test]
    fn punctuation_only_text_teaches_nothing() {
        let engine = LearningEngine::new(100);
        let mut index = WordIndex::new();
        let mut model = ContextModel::default();
        let mut usage = UsageStats::default();
        assert_eq!(engine.learn_text(&mut index, &mut model, &mut usage, "...", 1), 0);
        assert_eq!(engine.learn_text(&mut index, &mut model, &mut usage, "?! 42", 1), 0);
        assert_eq!(model.bigram_count(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn promotion_outranks_organic_use() {
        let engine = LearningEngine::new(100);
        let mut index = WordIndex::new();
        let mut usage = UsageStats::default();
        for _ in 0..5 {
            engine.learn_word(&mut index, &mut usage, "rusty", 1);
        }
        engine.promote(&mut index, &mut usage, "Rustacean", 2);
        assert_eq!(index.suggest("rust", 5), vec!["rustacean", "rusty"]);
        assert_eq!(index.entry("rustacean").map(|e| e.origin), Some(WordOrigin::UserDictionary));
        assert_eq!(usage.frequencies.get("rustacean"), Some(&100));
    }
}
