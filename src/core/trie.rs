// --- File: src/core/trie.rs
use crate::core::tokenizer::{normalize, MAX_WORD_LENGTH};
use crate::core::types::{now_millis, Timestamp, WordEntry, WordOrigin};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

#[derive(Clone, Serialize, Deserialize)]
struct TrieNode {
    children: HashMap<char, usize>,
    is_word: bool,
    frequency: u32,
    last_used_at: Timestamp,
    origin: WordOrigin,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            is_word: false,
            frequency: 0,
            last_used_at: 0,
            origin: WordOrigin::Bootstrap,
        }
    }
}

/// Prefix index over every word the keyboard knows about.
///
/// Nodes live in a flat arena and are addressed by index; the root is at 0.
/// Nodes are never reclaimed: removing a word only clears its `is_word` flag.
#[derive(Clone, Serialize, Deserialize)]
pub struct WordIndex {
    nodes: Vec<TrieNode>,
    word_count: usize,
}

impl WordIndex {
    pub fn new() -> Self {
        Self { nodes: vec![TrieNode::new()], word_count: 0 }
    }

    /// Records one use of `word`. Empty input is ignored.
    pub fn insert(&mut self, word: &str) {
        self.insert_with(word, WordOrigin::Learned, 1, now_millis());
    }

    /// Inserts `word`, adding `boost` to its frequency and upgrading its origin.
    /// O(k) where k is the word length. Empty words and words longer than
    /// `MAX_WORD_LENGTH` are ignored.
    pub fn insert_with(&mut self, word: &str, origin: WordOrigin, boost: u32, at: Timestamp) {
        let word = normalize(word);
        if word.is_empty() || word.chars().count() > MAX_WORD_LENGTH {
            return;
        }
        let idx = self.walk_or_create(&word);
        let node = &mut self.nodes[idx];
        if !node.is_word {
            node.is_word = true;
            node.origin = origin;
            self.word_count += 1;
        } else if origin > node.origin {
            node.origin = origin;
        }
        node.frequency = node.frequency.saturating_add(boost);
        node.last_used_at = node.last_used_at.max(at);
    }

    fn walk_or_create(&mut self, word: &str) -> usize {
        let mut node_idx = 0;
        for ch in word.chars() {
            let next_idx = if let Some(&id) = self.nodes[node_idx].children.get(&ch) {
                id
            } else {
                let new_node_id = self.nodes.len();
                self.nodes.push(TrieNode::new());
                self.nodes[node_idx].children.insert(ch, new_node_id);
                new_node_id
            };
            node_idx = next_idx;
        }
        node_idx
    }

    fn find(&self, key: &str) -> Option<usize> {
        let mut node_idx = 0;
        for ch in key.chars() {
            node_idx = *self.nodes[node_idx].children.get(&ch)?;
        }
        Some(node_idx)
    }

    fn find_word(&self, word: &str) -> Option<&TrieNode> {
        let word = normalize(word);
        if word.is_empty() {
            return None;
        }
        self.find(&word)
            .map(|idx| &self.nodes[idx])
            .filter(|node| node.is_word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.find_word(word).is_some()
    }

    pub fn frequency_of(&self, word: &str) -> u32 {
        self.find_word(word).map_or(0, |node| node.frequency)
    }

    pub fn entry(&self, word: &str) -> Option<WordEntry> {
        let text = normalize(word);
        self.find_word(&text).map(|node| entry_from(text, node))
    }

    /// Completions of `prefix`, best first, at most `limit` of them.
    ///
    /// Visits the whole subtree under the prefix node, so the cost grows with
    /// the number of words sharing the prefix.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.suggest_entries(prefix, limit)
            .into_iter()
            .map(|entry| entry.text)
            .collect()
    }

    pub fn suggest_entries(&self, prefix: &str, limit: usize) -> Vec<WordEntry> {
        let prefix = normalize(prefix);
        if prefix.is_empty() || limit == 0 {
            return vec![];
        }
        let Some(start) = self.find(&prefix) else {
            return vec![];
        };

        let mut found = Vec::new();
        self.collect(start, &prefix, &mut found);
        found.sort_by(rank_entries);
        found.truncate(limit);
        found
    }

    /// Depth-first walk with an explicit stack of `(node, depth, edge)`, so
    /// the call stack stays flat however long the stored words are.
    fn collect(&self, start: usize, prefix: &str, out: &mut Vec<WordEntry>) {
        let mut path: Vec<char> = prefix.chars().collect();
        let mut stack = vec![(start, path.len(), None)];
        while let Some((node_idx, depth, edge)) = stack.pop() {
            path.truncate(depth);
            path.extend(edge);
            let node = &self.nodes[node_idx];
            if node.is_word {
                out.push(entry_from(path.iter().collect(), node));
            }
            for (&ch, &child_idx) in &node.children {
                stack.push((child_idx, path.len(), Some(ch)));
            }
        }
    }

    /// Stops exposing `word`. The path stays allocated.
    pub fn remove(&mut self, word: &str) -> bool {
        let word = normalize(word);
        if word.is_empty() {
            return false;
        }
        match self.find(&word) {
            Some(idx) if self.nodes[idx].is_word => {
                let node = &mut self.nodes[idx];
                node.is_word = false;
                node.frequency = 0;
                node.last_used_at = 0;
                node.origin = WordOrigin::Bootstrap;
                self.word_count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Every visible word, sorted by text.
    pub fn entries(&self) -> Vec<WordEntry> {
        let mut out = Vec::with_capacity(self.word_count);
        self.collect(0, "", &mut out);
        out.sort_by(|a, b| a.text.cmp(&b.text));
        out
    }

    /// Re-applies persisted entries. Frequencies only ever move up.
    pub fn restore(&mut self, entries: &[WordEntry]) {
        for entry in entries {
            let current = self.frequency_of(&entry.text);
            let boost = entry.frequency.saturating_sub(current);
            self.insert_with(&entry.text, entry.origin, boost, entry.last_used_at);
        }
    }

    pub fn len(&self) -> usize {
        self.word_count
    }

    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }
}

impl Default for WordIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_from(text: String, node: &TrieNode) -> WordEntry {
    WordEntry {
        text,
        frequency: node.frequency,
        last_used_at: node.last_used_at,
        origin: node.origin,
    }
}

/// Frequency first, then user-dictionary words, then recency, then text.
fn rank_entries(a: &WordEntry, b: &WordEntry) -> Ordering {
    b.frequency
        .cmp(&a.frequency)
        .then_with(|| {
            let a_user = a.origin == WordOrigin::UserDictionary;
            let b_user = b.origin == WordOrigin::UserDictionary;
            b_user.cmp(&a_user)
        })
        .then_with(|| b.last_used_at.cmp(&a.last_used_at))
        .then_with(|| a.text.cmp(&b.text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_words_are_found_by_prefix() {
        let mut index = WordIndex::new();
        index.insert("hello");
        index.insert("help");
        index.insert("hero");

        assert!(index.contains("hello"));
        assert!(index.contains("HELP "));
        assert!(!index.contains("helicopter"));
        assert!(!index.contains("hel"));

        let suggestions = index.suggest("he", 10);
        for word in ["hello", "help", "hero"] {
            assert!(suggestions.contains(&word.to_string()), "missing {word}");
        }
    }

    #[test]
    fn repeated_inserts_raise_frequency() {
        let mut index = WordIndex::new();
        index.insert("world");
        assert_eq!(index.frequency_of("world"), 1);
        index.insert("World");
        assert_eq!(index.frequency_of("world"), 2);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn higher_frequency_ranks_first() {
        let mut index = WordIndex::new();
        index.insert_with("their", WordOrigin::Learned, 1, 100);
        index.insert_with("there", WordOrigin::Learned, 3, 50);
        index.insert_with("these", WordOrigin::Learned, 1, 200);

        assert_eq!(index.suggest("the", 5), vec!["there", "these", "their"]);
    }

    #[test]
    fn user_dictionary_wins_frequency_ties() {
        let mut index = WordIndex::new();
        index.insert_with("rusty", WordOrigin::Learned, 2, 500);
        index.insert_with("rustacean", WordOrigin::UserDictionary, 2, 10);

        assert_eq!(index.suggest("rust", 5), vec!["rustacean", "rusty"]);
    }

    #[test]
    fn empty_or_unknown_prefix_yields_nothing() {
        let mut index = WordIndex::new();
        index.insert("apple");
        assert!(index.suggest("", 5).is_empty());
        assert!(index.suggest("   ", 5).is_empty());
        assert!(index.suggest("b", 5).is_empty());
        index.insert("   ");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn limit_truncates() {
        let mut index = WordIndex::new();
        for word in ["car", "cart", "carton", "care", "carry", "cargo", "carbon"] {
            index.insert(word);
        }
        assert_eq!(index.suggest("car", 3).len(), 3);
        assert_eq!(index.suggest("car", DEFAULT_SUGGESTION_LIMIT).len(), 5);
    }

    #[test]
    fn remove_hides_word_but_keeps_descendants() {
        let mut index = WordIndex::new();
        index.insert("car");
        index.insert("cart");
        assert!(index.remove("car"));
        assert!(!index.contains("car"));
        assert_eq!(index.frequency_of("car"), 0);
        assert_eq!(index.suggest("ca", 5), vec!["cart"]);
        assert!(!index.remove("car"));
    }

    #[test]
    fn overlong_words_are_not_indexed() {
        let mut index = WordIndex::new();
        index.insert(&"a".repeat(MAX_WORD_LENGTH + 1));
        assert!(index.is_empty());
        assert!(index.entries().is_empty());
    }

    #[test]
    fn deep_words_are_collected() {
        let mut index = WordIndex::new();
        let long = "z".repeat(MAX_WORD_LENGTH);
        index.insert(&long);
        index.insert("zz");
        assert_eq!(index.suggest("z", 5), vec!["zz".to_string(), long.clone()]);
        let texts: Vec<String> = index.entries().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["zz".to_string(), long]);
    }

    #[test]
    fn arabic_words_are_indexed() {
        let mut index = WordIndex::new();
        index.insert("مدرسة");
        index.insert("مدينة");
        let suggestions = index.suggest("مد", 5);
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn restore_never_lowers_frequency() {
        let mut index = WordIndex::new();
        index.insert_with("hello", WordOrigin::Bootstrap, 4, 10);
        index.restore(&[
            WordEntry { text: "hello".into(), frequency: 2, last_used_at: 20, origin: WordOrigin::Learned },
            WordEntry { text: "world".into(), frequency: 7, last_used_at: 30, origin: WordOrigin::Learned },
        ]);
        assert_eq!(index.frequency_of("hello"), 4);
        assert_eq!(index.frequency_of("world"), 7);
        assert_eq!(index.entry("hello").map(|e| e.origin), Some(WordOrigin::Learned));
    }
}
