// File: src/core/layout.rs
use std::collections::HashMap;

pub const DEFAULT_KEY_WIDTH: f32 = 100.0;
pub const DEFAULT_KEY_HEIGHT: f32 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Arabic,
}

/// Key centers plus the neighbours of every key, for one script.
///
/// Keys are kept in row order so that nearest-key lookups break ties the
/// same way on every call.
#[derive(Debug, Clone)]
pub struct KeyboardLayout {
    script: Script,
    keys: Vec<(char, KeyPosition)>,
    proximity: HashMap<char, Vec<char>>,
}

const QWERTY_ROWS: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];
const ARABIC_ROWS: [&str; 3] = ["ضصثقفغعهخحج", "شسيبلاتنمكط", "ئءؤرىةوزظد"];

/// Row offsets, in key widths, of a staggered soft keyboard.
const ROW_OFFSETS: [f32; 3] = [0.0, 0.5, 1.5];

const QWERTY_PROXIMITY: [(char, &str); 26] = [
    ('q', "wa"), ('w', "qeas"), ('e', "wrsd"), ('r', "etdf"), ('t', "ryfg"),
    ('y', "tugh"), ('u', "yihj"), ('i', "uojk"), ('o', "ipkl"), ('p', "ol"),
    ('a', "qwsz"), ('s', "awedxz"), ('d', "serfcx"), ('f', "drtgvc"), ('g', "ftyhbv"),
    ('h', "gyujnb"), ('j', "huikmn"), ('k', "jiolm"), ('l', "kop"),
    ('z', "asx"), ('x', "zsdc"), ('c', "xdfv"), ('v', "cfgb"), ('b', "vghn"),
    ('n', "bhjm"), ('m', "njk"),
];

const ARABIC_PROXIMITY: [(char, &str); 28] = [
    ('ا', "سش"), ('ب', "لان"), ('ت', "نفب"), ('ث', "قفت"), ('ج', "حخ"),
    ('ح', "جخع"), ('خ', "حجع"), ('د', "ذجس"), ('ذ', "دشس"), ('ر', "زو"),
    ('ز', "رة"), ('س', "شاد"), ('ش', "سذا"), ('ص', "ضق"), ('ض', "صف"),
    ('ط', "ظك"), ('ظ', "طم"), ('ع', "حخغ"), ('غ', "عف"), ('ف', "قثت"),
    ('ق', "فصث"), ('ك', "مطل"), ('ل', "كاي"), ('م', "نظك"), ('ن', "تبم"),
    ('ه', "ةو"), ('و', "هرز"), ('ي', "لءئ"),
];

impl KeyboardLayout {
    pub fn qwerty(key_width: f32, key_height: f32) -> Self {
        Self::build(Script::Latin, &QWERTY_ROWS, &QWERTY_PROXIMITY, key_width, key_height)
    }

    pub fn arabic(key_width: f32, key_height: f32) -> Self {
        Self::build(Script::Arabic, &ARABIC_ROWS, &ARABIC_PROXIMITY, key_width, key_height)
    }

    pub fn for_script(script: Script, key_width: f32, key_height: f32) -> Self {
        match script {
            Script::Latin => Self::qwerty(key_width, key_height),
            Script::Arabic => Self::arabic(key_width, key_height),
        }
    }

    fn build(
        script: Script,
        rows: &[&str; 3],
        proximity: &[(char, &str)],
        key_width: f32,
        key_height: f32,
    ) -> Self {
        let mut keys = Vec::new();
        for (row, (letters, offset)) in rows.iter().zip(ROW_OFFSETS).enumerate() {
            for (i, ch) in letters.chars().enumerate() {
                keys.push((
                    ch,
                    KeyPosition {
                        x: (i as f32 + offset) * key_width + key_width / 2.0,
                        y: (row as f32 + 0.5) * key_height,
                    },
                ));
            }
        }
        let proximity = proximity
            .iter()
            .map(|(ch, near)| (*ch, near.chars().collect()))
            .collect();
        Self { script, keys, proximity }
    }

    pub fn script(&self) -> Script {
        self.script
    }

    pub fn position(&self, key: char) -> Option<KeyPosition> {
        self.keys.iter().find(|(c, _)| *c == key).map(|(_, p)| *p)
    }

    /// Keys physically next to `key`; empty when the key is unknown.
    pub fn neighbours(&self, key: char) -> &[char] {
        self.proximity.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The key whose center is closest to `(x, y)`. The first key in row
    /// order wins exact ties.
    pub fn nearest_key(&self, x: f32, y: f32) -> Option<char> {
        let mut nearest = None;
        let mut min_distance = f32::MAX;
        for (ch, pos) in &self.keys {
            let dist = distance(x, y, pos.x, pos.y);
            if dist < min_distance {
                min_distance = dist;
                nearest = Some(*ch);
            }
        }
        nearest
    }
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::qwerty(DEFAULT_KEY_WIDTH, DEFAULT_KEY_HEIGHT)
    }
}

pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qwerty_rows_are_staggered() {
        let layout = KeyboardLayout::qwerty(100.0, 100.0);
        assert_eq!(layout.position('q'), Some(KeyPosition { x: 50.0, y: 50.0 }));
        assert_eq!(layout.position('a'), Some(KeyPosition { x: 100.0, y: 150.0 }));
        assert_eq!(layout.position('z'), Some(KeyPosition { x: 200.0, y: 250.0 }));
    }

    #[test]
    fn nearest_key_snaps_to_centers() {
        let layout = KeyboardLayout::qwerty(100.0, 100.0);
        assert_eq!(layout.nearest_key(452.0, 48.0), Some('t'));
        assert_eq!(layout.nearest_key(-40.0, 10.0), Some('q'));
    }

    #[test]
    fn proximity_tables_cover_both_scripts() {
        let latin = KeyboardLayout::default();
        assert_eq!(latin.neighbours('y'), &['t', 'u', 'g', 'h']);
        assert!(latin.neighbours('1').is_empty());

        let arabic = KeyboardLayout::arabic(80.0, 120.0);
        assert_eq!(arabic.script(), Script::Arabic);
        assert!(arabic.neighbours('ب').contains(&'ن'));
        assert!(arabic.position('ض').is_some());
    }
}
