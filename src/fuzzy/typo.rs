// File: src/fuzzy/typo.rs
use crate::core::layout::KeyboardLayout;
use crate::core::tokenizer::MAX_WORD_LENGTH;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Two tokens within this many edits are considered typo-related.
pub const DEFAULT_MAX_EDIT_DISTANCE: usize = 2;

/// Case-insensitive Levenshtein distance over Unicode scalar values.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows of the classic DP table.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `edit_distance` for inputs that may be absent; a missing side is
/// infinitely far from everything.
pub fn edit_distance_opt(a: Option<&str>, b: Option<&str>) -> usize {
    match (a, b) {
        (Some(a), Some(b)) => edit_distance(a, b),
        _ => usize::MAX,
    }
}

/// Generates dictionary words the user probably meant to type.
///
/// Cheap targeted passes (transposition, missing character, extra character,
/// neighbouring key) run first; a brute-force edit-distance scan over the
/// whole dictionary only picks up what they miss.
#[derive(Debug, Clone)]
pub struct TypoGenerator {
    layout: Arc<KeyboardLayout>,
}

/// Lower-cased dictionary, first spelling wins.
struct DictionaryIndex<'a> {
    words: Vec<(&'a str, Vec<char>)>,
    by_lower: HashMap<String, &'a str>,
}

impl<'a> DictionaryIndex<'a> {
    fn new<S: AsRef<str>>(dictionary: &'a [S]) -> Self {
        let mut words = Vec::with_capacity(dictionary.len());
        let mut by_lower = HashMap::with_capacity(dictionary.len());
        for word in dictionary {
            let word = word.as_ref();
            let lower: String = word.to_lowercase();
            words.push((word, lower.chars().collect()));
            by_lower.entry(lower).or_insert(word);
        }
        Self { words, by_lower }
    }

    fn get(&self, chars: &[char]) -> Option<&'a str> {
        let key: String = chars.iter().collect();
        self.by_lower.get(&key).copied()
    }
}

/// Collects results in pass order, skipping duplicates and the input itself.
struct Collector<'a> {
    input: &'a [char],
    seen: HashSet<String>,
    out: Vec<String>,
}

impl Collector<'_> {
    fn push(&mut self, word: &str) {
        let lower = word.to_lowercase();
        if lower.chars().eq(self.input.iter().copied()) {
            return;
        }
        if self.seen.insert(lower) {
            self.out.push(word.to_string());
        }
    }
}

impl TypoGenerator {
    pub fn new(layout: Arc<KeyboardLayout>) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    pub fn generate<S: AsRef<str>>(&self, word: &str, dictionary: &[S], max_distance: usize) -> Vec<String> {
        let input: Vec<char> = word.trim().chars().flat_map(char::to_lowercase).collect();
        if input.is_empty() || input.len() > MAX_WORD_LENGTH || dictionary.is_empty() {
            return vec![];
        }
        let index = DictionaryIndex::new(dictionary);
        let mut found = Collector { input: &input, seen: HashSet::new(), out: Vec::new() };

        for hit in transpositions(&input, &index) {
            found.push(hit);
        }
        for hit in missing_character(&input, &index) {
            found.push(hit);
        }
        for hit in extra_character(&input, &index) {
            found.push(hit);
        }
        for hit in self.proximity_substitutions(&input, &index) {
            found.push(hit);
        }

        let lower_input: String = input.iter().collect();
        for (word, _) in &index.words {
            if found.seen.contains(&word.to_lowercase()) {
                continue;
            }
            let distance = edit_distance(&lower_input, word);
            if distance > 0 && distance <= max_distance {
                found.push(word);
            }
        }

        found.out
    }

    /// Replaces each character with each of its keyboard neighbours.
    fn proximity_substitutions<'a>(&self, input: &[char], index: &DictionaryIndex<'a>) -> Vec<&'a str> {
        let mut hits = Vec::new();
        let mut variant = input.to_vec();
        for i in 0..input.len() {
            for &near in self.layout.neighbours(input[i]) {
                variant[i] = near;
                if let Some(hit) = index.get(&variant) {
                    hits.push(hit);
                }
            }
            variant[i] = input[i];
        }
        hits
    }
}

/// Swapped adjacent characters, e.g. "teh" -> "the".
fn transpositions<'a>(input: &[char], index: &DictionaryIndex<'a>) -> Vec<&'a str> {
    let mut hits = Vec::new();
    if input.len() < 2 {
        return hits;
    }
    let mut variant = input.to_vec();
    for i in 0..input.len() - 1 {
        variant.swap(i, i + 1);
        if let Some(hit) = index.get(&variant) {
            hits.push(hit);
        }
        variant.swap(i, i + 1);
    }
    hits
}

/// Dictionary words one character longer than the input that reduce to it
/// when one character is dropped, e.g. "wrld" -> "world".
fn missing_character<'a>(input: &[char], index: &DictionaryIndex<'a>) -> Vec<&'a str> {
    index
        .words
        .iter()
        .filter(|(_, chars)| chars.len() == input.len() + 1)
        .filter(|(_, chars)| {
            (0..chars.len()).any(|skip| {
                chars
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, c)| c)
                    .eq(input.iter())
            })
        })
        .map(|(word, _)| *word)
        .collect()
}

/// Input with one character dropped, e.g. "helllo" -> "hello".
fn extra_character<'a>(input: &[char], index: &DictionaryIndex<'a>) -> Vec<&'a str> {
    let mut hits = Vec::new();
    if input.len() < 2 {
        return hits;
    }
    for skip in 0..input.len() {
        let variant: Vec<char> = input
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, c)| *c)
            .collect();
        if let Some(hit) = index.get(&variant) {
            hits.push(hit);
        }
    }
    hits
}
