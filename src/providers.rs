// File: src/providers.rs
//! Data providers and external suggestion sources the engine consumes.

/// Seed vocabulary so suggestions are useful before any learning happens.
pub trait BootstrapProvider: Send + Sync {
    fn words(&self) -> Vec<String>;
    fn seed_sentences(&self) -> Vec<String>;
    /// Offered when there is neither a typed word nor anything to predict from.
    fn starters(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Results from collaborators outside the core (calculator, clipboard,
/// email domains, emoji keywords). They are shown ahead of ranked words.
pub trait SuggestionProvider: Send + Sync {
    fn name(&self) -> &str;
    fn suggest(&self, current_word: &str, previous_context: &str) -> Vec<String>;
}

const ENGLISH_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "its", "may", "new", "now", "old",
    "see", "two", "way", "who", "boy", "did", "man", "car", "dog", "cat", "run", "big", "red",
    "home", "work", "time", "year", "back", "call", "came", "each", "good", "here", "know",
    "last", "life", "live", "look", "make", "most", "move", "must", "name", "need", "next",
    "only", "open", "over", "play", "said", "same", "seem", "show", "side", "tell", "turn",
    "used", "want", "ways", "well", "went", "were", "what", "when", "with", "word", "your",
    "about", "after", "again", "before", "being", "below", "could", "every", "first", "found",
    "great", "group", "house", "large", "place", "right", "small", "sound", "still", "such",
    "those", "three", "under", "water", "where", "which", "world", "would", "write", "young",
];

const ARABIC_WORDS: &[&str] = &[
    "في", "من", "على", "إلى", "هذا", "هذه", "التي", "الذي", "كان", "كانت", "يكون", "تكون",
    "لكن", "أيضا", "أيضاً", "بعد", "قبل", "عند", "حول", "حتى", "أثناء", "خلال", "كل",
    "بعض", "جميع", "معظم", "أكثر", "أقل", "أول", "آخر", "جديد", "قديم", "كبير", "صغير",
    "طويل", "قصير", "جميل", "سهل", "صعب", "مهم", "ضروري", "ممكن", "مستحيل", "صحيح",
    "خطأ", "جيد", "سيء", "أبيض", "أسود", "أحمر", "أزرق", "أخضر", "أصفر", "بيت", "منزل",
    "مدرسة", "عمل", "مكتب", "طريق", "شارع", "مدينة", "قرية", "دولة", "عالم", "شخص",
    "رجل", "امرأة", "طفل", "أسرة", "صديق", "يوم", "ليلة", "صباح", "مساء", "وقت", "ساعة",
];

const SEED_SENTENCES: &[&str] = &[
    "I am going to",
    "How are you",
    "What is your",
    "Thank you very much",
    "Have a good day",
    "See you later",
    "Nice to meet you",
    "How do you do",
    "What time is it",
    "Where are you from",
    "كيف حالك اليوم",
    "أهلا وسهلا بك",
    "شكرا لك جزيلا",
    "مع السلامة",
    "يوم سعيد",
    "إن شاء الله",
    "الحمد لله",
    "ما شاء الله",
];

const STARTERS: &[&str] = &["the", "and", "for", "you", "are"];

/// Built-in English and Arabic vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticBootstrap;

impl BootstrapProvider for StaticBootstrap {
    fn words(&self) -> Vec<String> {
        ENGLISH_WORDS
            .iter()
            .chain(ARABIC_WORDS)
            .map(|w| w.to_string())
            .collect()
    }

    fn seed_sentences(&self) -> Vec<String> {
        SEED_SENTENCES.iter().map(|s| s.to_string()).collect()
    }

    fn starters(&self) -> Vec<String> {
        STARTERS.iter().map(|s| s.to_string()).collect()
    }
}

/// No seed data at all; handy for hosts that ship their own dictionary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBootstrap;

impl BootstrapProvider for EmptyBootstrap {
    fn words(&self) -> Vec<String> {
        Vec::new()
    }

    fn seed_sentences(&self) -> Vec<String> {
        Vec::new()
    }
}
