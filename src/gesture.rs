// File: src/gesture.rs
//! Swipe typing: turns a continuous touch path into candidate words.
use crate::core::layout::{distance, KeyboardLayout};
use crate::core::types::{now_millis, Timestamp};
use crate::fuzzy::typo::TypoGenerator;
use std::sync::Arc;

pub const MIN_POINTS: usize = 5;
pub const MIN_SAMPLE_DISTANCE: f32 = 10.0;

/// Edit budget for the proximity pass over the extracted key sequence.
const GESTURE_TYPO_DISTANCE: usize = 1;

const COVERAGE_WEIGHT: f64 = 100.0;
const LENGTH_WEIGHT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GesturePoint {
    pub x: f32,
    pub y: f32,
    pub timestamp: Timestamp,
}

/// Points of one swipe, in the order they were reported.
#[derive(Debug, Clone)]
pub struct GesturePath {
    points: Vec<GesturePoint>,
    start_time: Timestamp,
    end_time: Option<Timestamp>,
}

impl GesturePath {
    pub fn new() -> Self {
        Self::starting_at(now_millis())
    }

    pub fn starting_at(start_time: Timestamp) -> Self {
        Self { points: Vec::new(), start_time, end_time: None }
    }

    /// Appends a point. Ignored once the path is finished.
    pub fn add_point(&mut self, x: f32, y: f32) {
        self.add_point_at(x, y, now_millis());
    }

    pub fn add_point_at(&mut self, x: f32, y: f32, timestamp: Timestamp) {
        if self.end_time.is_none() {
            self.points.push(GesturePoint { x, y, timestamp });
        }
    }

    /// Marks the end of the swipe; the path is immutable afterwards.
    pub fn finish(&mut self) {
        if self.end_time.is_none() {
            let last = self.points.last().map_or(self.start_time, |p| p.timestamp);
            self.end_time = Some(now_millis().max(last));
        }
    }

    pub fn points(&self) -> &[GesturePoint] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn duration(&self) -> Timestamp {
        self.end_time.unwrap_or(self.start_time).saturating_sub(self.start_time)
    }

    pub fn is_valid(&self) -> bool {
        self.points.len() >= MIN_POINTS
    }
}

impl Default for GesturePath {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateless decoder; holds only the shared layout and its settings.
#[derive(Debug, Clone)]
pub struct GestureDecoder {
    layout: Arc<KeyboardLayout>,
    typos: TypoGenerator,
    min_points: usize,
    min_sample_distance: f32,
}

impl GestureDecoder {
    pub fn new(layout: Arc<KeyboardLayout>) -> Self {
        Self::with_settings(layout, MIN_POINTS, MIN_SAMPLE_DISTANCE)
    }

    pub fn with_settings(layout: Arc<KeyboardLayout>, min_points: usize, min_sample_distance: f32) -> Self {
        Self {
            typos: TypoGenerator::new(layout.clone()),
            layout,
            min_points,
            min_sample_distance,
        }
    }

    /// Candidate words for `path`, best first.
    ///
    /// Words whose letters appear in order in the swiped key sequence come
    /// first, ranked by [`score_match`](Self::score_match); words one
    /// neighbouring-key slip away from the sequence follow.
    pub fn decode<S: AsRef<str>>(&self, path: &GesturePath, dictionary: &[S]) -> Vec<String> {
        if path.point_count() < self.min_points || dictionary.is_empty() {
            return vec![];
        }
        let keys = self.key_sequence(path);
        if keys.is_empty() {
            return vec![];
        }

        let mut matches: Vec<(String, f64)> = dictionary
            .iter()
            .map(|w| w.as_ref())
            .filter(|w| !w.is_empty() && is_subsequence(&w.to_lowercase(), &keys))
            .map(|w| (w.to_string(), score_keys(w, &keys)))
            .collect();
        matches.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut out: Vec<String> = Vec::with_capacity(matches.len());
        for (word, _) in matches {
            if !out.iter().any(|w| w.eq_ignore_ascii_case(&word)) {
                out.push(word);
            }
        }
        for word in self.typos.generate(&keys, dictionary, GESTURE_TYPO_DISTANCE) {
            if !out.iter().any(|w| w.to_lowercase() == word.to_lowercase()) {
                out.push(word);
            }
        }
        out
    }

    /// The keys the path passes over, with consecutive repeats collapsed.
    pub fn key_sequence(&self, path: &GesturePath) -> String {
        let mut sequence = String::new();
        let mut last_key = None;
        for point in self.sample(path.points()) {
            let nearest = self.layout.nearest_key(point.x, point.y);
            if nearest.is_some() && nearest != last_key {
                sequence.extend(nearest);
                last_key = nearest;
            }
        }
        sequence
    }

    /// How well `word` fits the swipe: coverage of its letters in sequence
    /// order plus similarity of lengths. Zero for invalid paths.
    pub fn score_match(&self, word: &str, path: &GesturePath) -> f64 {
        if word.is_empty() || path.point_count() < self.min_points {
            return 0.0;
        }
        score_keys(word, &self.key_sequence(path))
    }

    /// Keeps the first and last points and any point at least the minimum
    /// distance from the previously kept one.
    fn sample<'a>(&self, points: &'a [GesturePoint]) -> Vec<&'a GesturePoint> {
        let Some((first, rest)) = points.split_first() else {
            return vec![];
        };
        let mut sampled = vec![first];
        let mut last_kept = first;
        for point in rest {
            if distance(last_kept.x, last_kept.y, point.x, point.y) >= self.min_sample_distance {
                sampled.push(point);
                last_kept = point;
            }
        }
        if let Some(last) = rest.last() {
            if !std::ptr::eq(last, last_kept) {
                sampled.push(last);
            }
        }
        sampled
    }
}

fn is_subsequence(word: &str, keys: &str) -> bool {
    let mut keys = keys.chars();
    word.chars().all(|c| keys.any(|k| k == c))
}

fn score_keys(word: &str, keys: &str) -> f64 {
    let word: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
    let keys: Vec<char> = keys.chars().collect();
    if word.is_empty() || keys.is_empty() {
        return 0.0;
    }

    let mut matched = 0usize;
    let mut seq = 0usize;
    for c in &word {
        while seq < keys.len() {
            seq += 1;
            if keys[seq - 1] == *c {
                matched += 1;
                break;
            }
        }
    }

    let coverage = matched as f64 / word.len() as f64;
    let length_ratio = word.len().min(keys.len()) as f64 / word.len().max(keys.len()) as f64;
    coverage * COVERAGE_WEIGHT + length_ratio * LENGTH_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Arc<KeyboardLayout> {
        Arc::new(KeyboardLayout::qwerty(100.0, 100.0))
    }

    /// A path that dwells on each key center twice.
    fn swipe_over(layout: &KeyboardLayout, keys: &str) -> GesturePath {
        let mut path = GesturePath::starting_at(0);
        for (i, key) in keys.chars().enumerate() {
            let pos = layout.position(key).expect("key on layout");
            path.add_point_at(pos.x, pos.y, i as u64 * 20);
            path.add_point_at(pos.x + 1.0, pos.y + 1.0, i as u64 * 20 + 10);
        }
        path.finish();
        path
    }

    #[test]
    fn short_paths_are_rejected() {
        let decoder = GestureDecoder::new(layout());
        let mut path = GesturePath::starting_at(0);
        for i in 0..4 {
            path.add_point_at(i as f32 * 50.0, 50.0, i);
        }
        assert!(!path.is_valid());
        assert!(decoder.decode(&path, &["we"]).is_empty());
        assert_eq!(decoder.score_match("we", &path), 0.0);
    }

    #[test]
    fn dwell_is_collapsed() {
        let layout = layout();
        let decoder = GestureDecoder::new(layout.clone());
        let path = swipe_over(&layout, "test");
        assert_eq!(decoder.key_sequence(&path), "test");
    }

    #[test]
    fn exact_swipe_decodes_and_ranks() {
        let layout = layout();
        let decoder = GestureDecoder::new(layout.clone());
        let path = swipe_over(&layout, "test");
        let words = decoder.decode(&path, &["tet", "test", "best"]);
        assert_eq!(words[0], "test");
        assert!(words.contains(&"tet".to_string()));
        assert!(decoder.score_match("test", &path) > decoder.score_match("tet", &path));
    }

    #[test]
    fn neighbouring_key_slip_still_finds_word() {
        let layout = layout();
        let decoder = GestureDecoder::new(layout.clone());
        let path = swipe_over(&layout, "tesy");
        assert_eq!(decoder.key_sequence(&path), "tesy");
        let words = decoder.decode(&path, &["test", "rest"]);
        assert!(words.contains(&"test".to_string()));
    }

    #[test]
    fn finished_path_ignores_new_points() {
        let mut path = GesturePath::starting_at(0);
        path.add_point_at(1.0, 1.0, 5);
        path.finish();
        path.add_point_at(2.0, 2.0, 6);
        assert_eq!(path.point_count(), 1);
        assert!(path.is_finished());
    }

    #[test]
    fn sampling_drops_jitter_but_keeps_the_end() {
        let decoder = GestureDecoder::new(layout());
        let points: Vec<GesturePoint> = [(0.0, 0.0), (2.0, 0.0), (4.0, 0.0), (30.0, 0.0), (33.0, 0.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| GesturePoint { x, y, timestamp: i as u64 })
            .collect();
        let sampled: Vec<f32> = decoder.sample(&points).iter().map(|p| p.x).collect();
        assert_eq!(sampled, vec![0.0, 30.0, 33.0]);
    }
}
