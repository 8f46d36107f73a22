// File: src/core/tokenizer.rs
//! Shared tokenizer used by both the learning path and the context model.
//!
//! Punctuation marks and runs of pictographs (emoji) are emitted as atomic
//! tokens so they are never split mid-codepoint, and single-character words
//! are kept because they are valid words in several languages.

const SENTENCE_PUNCTUATION: [char; 6] = ['.', '!', '?', ';', ':', ','];

/// Longest token, in characters, that is indexed or corrected as a word.
pub const MAX_WORD_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Punctuation(String),
    Pictograph(String),
}

impl Token {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(s) | Token::Punctuation(s) | Token::Pictograph(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Token::Word(s) | Token::Punctuation(s) | Token::Pictograph(s) => s,
        }
    }
}

/// True for code points in the common emoji blocks, including the joiners
/// and variation selectors that glue multi-codepoint emoji together.
pub fn is_pictograph_char(c: char) -> bool {
    matches!(c as u32,
        0x1F600..=0x1F64F
        | 0x1F300..=0x1F5FF
        | 0x1F680..=0x1F6FF
        | 0x1F1E6..=0x1F1FF
        | 0x2600..=0x26FF
        | 0x2700..=0x27BF
        | 0xE0020..=0xE007F
        | 0xFE00..=0xFE0F
        | 0x1F900..=0x1F9FF
        | 0x1F018..=0x1F270
        | 0x200D
        | 0x23E9..=0x23F3
        | 0x23F8..=0x23FA)
}

pub fn is_pictograph(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().all(is_pictograph_char)
}

pub fn is_sentence_punctuation(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if SENTENCE_PUNCTUATION.contains(&c))
}

/// Lowercases and trims a word. Pictographs are returned untouched.
pub fn normalize(word: &str) -> String {
    let trimmed = word.trim();
    if is_pictograph(trimmed) {
        return trimmed.to_string();
    }
    trimmed.to_lowercase()
}

/// Normalization used for n-gram keys: lowercase, and drop everything that
/// is not a letter, digit or apostrophe. Punctuation and pictograph tokens
/// pass through unchanged.
pub fn normalize_token(token: &str) -> String {
    let trimmed = token.trim();
    if is_pictograph(trimmed) || is_sentence_punctuation(trimmed) {
        return trimmed.to_string();
    }
    trimmed
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A token is worth learning as a word only if it carries a letter or a
/// pictograph. Pure punctuation and bare numbers are rejected.
pub fn is_learnable_word(token: &str) -> bool {
    let trimmed = token.trim();
    !trimmed.is_empty()
        && trimmed.chars().count() <= MAX_WORD_LENGTH
        && trimmed
            .chars()
            .any(|c| c.is_alphabetic() || is_pictograph_char(c))
}

pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut pictograph = String::new();

    fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            let normalized = normalize_token(word);
            if !normalized.is_empty() {
                tokens.push(Token::Word(normalized));
            }
            word.clear();
        }
    }

    fn flush_pictograph(pictograph: &mut String, tokens: &mut Vec<Token>) {
        if !pictograph.is_empty() {
            tokens.push(Token::Pictograph(std::mem::take(pictograph)));
        }
    }

    for c in text.chars() {
        if is_pictograph_char(c) {
            flush_word(&mut word, &mut tokens);
            pictograph.push(c);
            continue;
        }
        flush_pictograph(&mut pictograph, &mut tokens);

        if c.is_whitespace() {
            flush_word(&mut word, &mut tokens);
        } else if SENTENCE_PUNCTUATION.contains(&c) {
            flush_word(&mut word, &mut tokens);
            tokens.push(Token::Punctuation(c.to_string()));
        } else {
            word.push(c);
        }
    }
    flush_word(&mut word, &mut tokens);
    flush_pictograph(&mut pictograph, &mut tokens);

    tokens
}

/// Token texts only, in order.
pub fn tokenize_strings(text: &str) -> Vec<String> {
    tokenize(text).into_iter().map(Token::into_string).collect()
}

/// Word and pictograph tokens that pass the validity filter.
pub fn learnable_words(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !matches!(t, Token::Punctuation(_)))
        .map(Token::into_string)
        .filter(|t| is_learnable_word(t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_is_split_off() {
        assert_eq!(
            tokenize_strings("Hello, world!"),
            vec!["hello", ",", "world", "!"]
        );
    }

    #[test]
    fn single_letter_words_survive() {
        assert_eq!(tokenize_strings("I have a cat"), vec!["i", "have", "a", "cat"]);
        assert_eq!(tokenize_strings("قال و ذهب"), vec!["قال", "و", "ذهب"]);
    }

    #[test]
    fn pictograph_runs_are_atomic() {
        let tokens = tokenize("good night😴🌙 friend");
        assert_eq!(
            tokens,
            vec![
                Token::Word("good".into()),
                Token::Word("night".into()),
                Token::Pictograph("😴🌙".into()),
                Token::Word("friend".into()),
            ]
        );
    }

    #[test]
    fn apostrophes_are_kept_but_quotes_dropped() {
        assert_eq!(tokenize_strings("don't \"quote\""), vec!["don't", "quote"]);
    }

    #[test]
    fn validity_filter_needs_a_letter_or_pictograph() {
        assert!(is_learnable_word("a"));
        assert!(is_learnable_word("مرحبا"));
        assert!(is_learnable_word("🎉"));
        assert!(!is_learnable_word("..."));
        assert!(!is_learnable_word("1234"));
        assert!(!is_learnable_word("   "));
    }

    #[test]
    fn learnable_words_skip_punctuation_and_numbers() {
        assert_eq!(learnable_words("Call me at 5, ok?"), vec!["call", "me", "at", "ok"]);
    }
}
