// File: src/core/engine.rs
use crate::config::EngineConfig;
use crate::core::layout::KeyboardLayout;
use crate::core::ranker::{RankingContext, RankingWeights, SuggestionRanker};
use crate::core::tokenizer::{learnable_words, normalize};
use crate::core::types::{now_millis, Candidate, CandidateSource, WordOrigin};
use crate::core::{context::ContextModel, trie::WordIndex};
use crate::error::{EngineError, Result};
use crate::fuzzy::typo::TypoGenerator;
use crate::gesture::{GestureDecoder, GesturePath};
use crate::learning::{LearningEngine, UsageStats};
use crate::persistence::{FlushPolicy, LearningEvent, PersistencePort, PersistenceScheduler, Snapshot};
use crate::providers::{BootstrapProvider, StaticBootstrap, SuggestionProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts describing what the engine has learned so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct EngineStats {
    pub words: usize,
    pub user_words: usize,
    pub bigram_contexts: usize,
    pub trigram_contexts: usize,
}

/// Collaborators and settings for one keyboard session.
pub struct EngineBuilder {
    config: EngineConfig,
    storage: Option<Arc<dyn PersistencePort>>,
    bootstrap: Box<dyn BootstrapProvider>,
    layout: Option<Arc<KeyboardLayout>>,
    providers: Vec<Box<dyn SuggestionProvider>>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn storage(mut self, storage: Arc<dyn PersistencePort>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn bootstrap(mut self, bootstrap: impl BootstrapProvider + 'static) -> Self {
        self.bootstrap = Box::new(bootstrap);
        self
    }

    pub fn layout(mut self, layout: KeyboardLayout) -> Self {
        self.layout = Some(Arc::new(layout));
        self
    }

    pub fn provider(mut self, provider: impl SuggestionProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Seeds the bootstrap vocabulary, loads persisted state and starts the
    /// background writer. Fails without a storage handle.
    pub fn build(self) -> Result<ImeEngine> {
        let storage = self.storage.ok_or(EngineError::MissingStorage)?;
        let config = self.config;
        let layout = self.layout.unwrap_or_else(|| {
            Arc::new(KeyboardLayout::qwerty(config.gesture.key_width, config.gesture.key_height))
        });
        let policy = FlushPolicy {
            input_batch: config.persistence.input_batch,
            word_batch: config.persistence.word_batch,
        };
        let ranker = SuggestionRanker::new(RankingWeights {
            max_edit_distance: config.suggestions.typo_max_distance,
            ..RankingWeights::default()
        });

        let mut engine = ImeEngine {
            index: WordIndex::new(),
            context_model: ContextModel::new(config.context.max_contexts),
            usage: UsageStats::default(),
            user_words: HashSet::new(),
            suppressed: HashSet::new(),
            learning: LearningEngine::new(config.suggestions.user_dictionary_boost),
            ranker,
            typos: TypoGenerator::new(layout.clone()),
            gesture: GestureDecoder::with_settings(
                layout.clone(),
                config.gesture.min_points,
                config.gesture.min_sample_distance,
            ),
            layout,
            bootstrap: self.bootstrap,
            providers: self.providers,
            scheduler: PersistenceScheduler::spawn(storage.clone(), policy)?,
            config,
        };
        engine.seed_bootstrap();
        engine.load_persisted(storage.as_ref());

        let stats = engine.stats();
        info!(
            words = stats.words,
            user_words = stats.user_words,
            bigram_contexts = stats.bigram_contexts,
            trigram_contexts = stats.trigram_contexts,
            "keyboard engine ready"
        );
        Ok(engine)
    }
}

/// The suggestion and learning engine of one keyboard session.
///
/// Every call runs synchronously on the caller's thread; only snapshot
/// writes happen in the background.
pub struct ImeEngine {
    index: WordIndex,
    context_model: ContextModel,
    usage: UsageStats,
    user_words: HashSet<String>,
    /// Removed words that other sources must not bring back.
    suppressed: HashSet<String>,
    learning: LearningEngine,
    ranker: SuggestionRanker,
    typos: TypoGenerator,
    gesture: GestureDecoder,
    layout: Arc<KeyboardLayout>,
    bootstrap: Box<dyn BootstrapProvider>,
    providers: Vec<Box<dyn SuggestionProvider>>,
    scheduler: PersistenceScheduler,
    config: EngineConfig,
}

impl ImeEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder {
            config: EngineConfig::default(),
            storage: None,
            bootstrap: Box::new(StaticBootstrap),
            layout: None,
            providers: Vec::new(),
        }
    }

    fn seed_bootstrap(&mut self) {
        for word in self.bootstrap.words() {
            self.index.insert_with(&word, WordOrigin::Bootstrap, 1, 0);
        }
        for sentence in self.bootstrap.seed_sentences() {
            self.context_model.learn_sentence(&sentence);
        }
    }

    fn load_persisted(&mut self, storage: &dyn PersistencePort) {
        match storage.load_word_entries() {
            Ok(entries) => {
                self.index.restore(&entries);
                self.usage.absorb(&entries);
            }
            Err(e) => warn!(error = %e, "could not load learned words, starting fresh"),
        }

        match storage.load_user_words() {
            Ok(words) => {
                for word in words {
                    let word = normalize(&word);
                    let restored = self
                        .index
                        .entry(&word)
                        .is_some_and(|e| e.origin == WordOrigin::UserDictionary);
                    if !restored {
                        self.learning.promote(&mut self.index, &mut self.usage, &word, now_millis());
                    }
                    if !word.is_empty() {
                        self.user_words.insert(word);
                    }
                }
            }
            Err(e) => warn!(error = %e, "could not load user dictionary"),
        }

        match storage.load_ngram_blob() {
            Ok(blob) if !blob.trim().is_empty() => self.context_model.deserialize(&blob),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "could not load n-gram data"),
        }
    }

    /// Up to `max_suggestions` words, phrases or punctuation marks for the
    /// word being typed and the text before it.
    pub fn get_suggestions(&self, current_word: Option<&str>, previous_context: Option<&str>) -> Vec<String> {
        let current = current_word.map(str::trim).unwrap_or("");
        let context = previous_context.map(str::trim).unwrap_or("");
        let max = self.config.suggestions.max_suggestions;
        let mut seen: HashSet<String> = HashSet::new();

        let mut pinned: Vec<String> = Vec::new();
        for provider in &self.providers {
            for text in provider.suggest(current, context) {
                if !text.is_empty() && seen.insert(text.to_lowercase()) {
                    pinned.push(text);
                }
            }
        }

        let mut pool: Vec<Candidate> = Vec::new();
        let mut add = |text: String, source: CandidateSource, pool: &mut Vec<Candidate>| {
            if text.is_empty() || self.suppressed.contains(&text.to_lowercase()) {
                return;
            }
            if seen.insert(text.to_lowercase()) {
                pool.push(Candidate::new(text, source));
            }
        };

        if !current.is_empty() {
            let limit = self.config.suggestions.completion_limit;
            for word in self.index.suggest(current, limit) {
                let source = CandidateSource::classify(&word, current, 0);
                add(word, source, &mut pool);
            }
            for word in self.user_dictionary_completions(current) {
                add(word, CandidateSource::Prefix, &mut pool);
            }
        }

        if !context.is_empty() {
            for word in self.context_model.predict_next(context) {
                add(word, CandidateSource::Context, &mut pool);
            }
            for mark in self.context_model.suggest_punctuation(context) {
                add(mark, CandidateSource::Prediction, &mut pool);
            }
        }

        if !current.is_empty() {
            let dictionary: Vec<String> = self.index.entries().into_iter().map(|e| e.text).collect();
            let max_distance = self.config.suggestions.typo_max_distance;
            for word in self.typos.generate(current, &dictionary, max_distance) {
                add(word, CandidateSource::Typo, &mut pool);
            }
        }

        if pool.is_empty() && pinned.is_empty() && current.is_empty() {
            for word in self.bootstrap.starters() {
                add(word, CandidateSource::Prediction, &mut pool);
            }
        }

        let ctx = RankingContext {
            current_word: current,
            previous_context: context,
            frequencies: &self.usage.frequencies,
            recency: &self.usage.recency,
            now: now_millis(),
        };
        let ranked = self.ranker.rank_candidates(pool, &ctx);
        debug!(current, candidates = ranked.len(), pinned = pinned.len(), "ranked suggestions");

        pinned
            .into_iter()
            .chain(ranked.into_iter().map(|c| c.text))
            .take(max)
            .collect()
    }

    fn user_dictionary_completions(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize(prefix);
        let mut words: Vec<String> = self
            .user_words
            .iter()
            .filter(|w| w.starts_with(&prefix))
            .cloned()
            .collect();
        words.sort();
        words.truncate(self.config.suggestions.completion_limit);
        words
    }

    /// Learns words and word order from arbitrary typed text.
    pub fn learn_from_input(&mut self, text: &str) {
        if self.learn_text(text) {
            self.persist(LearningEvent::Input);
        }
    }

    /// Learns one completed word.
    pub fn learn_word(&mut self, word: &str) {
        let now = now_millis();
        if self.learning.learn_word(&mut self.index, &mut self.usage, word, now) {
            for word in learnable_words(word) {
                self.suppressed.remove(&word);
            }
            self.persist(LearningEvent::Word);
        }
    }

    /// Learns a completed sentence and writes it out right away.
    pub fn learn_sentence(&mut self, sentence: &str) {
        if self.learn_text(sentence) {
            self.persist(LearningEvent::Sentence);
        }
    }

    fn learn_text(&mut self, text: &str) -> bool {
        let now = now_millis();
        let learned =
            self.learning
                .learn_text(&mut self.index, &mut self.context_model, &mut self.usage, text, now);
        if learned == 0 {
            return false;
        }
        for word in learnable_words(text) {
            self.suppressed.remove(&word);
        }
        debug!(learned, "learned from text");
        true
    }

    pub fn add_to_user_dictionary(&mut self, word: &str) {
        let now = now_millis();
        if !self.learning.promote(&mut self.index, &mut self.usage, word, now) {
            return;
        }
        let word = normalize(word);
        self.suppressed.remove(&word);
        if self.user_words.insert(word) {
            self.persist(LearningEvent::UserDictionary);
        }
    }

    /// Stops suggesting `word`, wherever it came from.
    pub fn remove_word(&mut self, word: &str) {
        let word = normalize(word);
        if word.is_empty() {
            return;
        }
        self.index.remove(&word);
        self.user_words.remove(&word);
        self.usage.forget(&word);
        self.suppressed.insert(word);
        self.persist(LearningEvent::Removal);
    }

    pub fn is_in_user_dictionary(&self, word: &str) -> bool {
        self.user_words.contains(&normalize(word))
    }

    /// Candidate words for a finished swipe over the active layout.
    pub fn decode_gesture<S: AsRef<str>>(&self, path: &GesturePath, dictionary: &[S]) -> Vec<String> {
        self.gesture.decode(path, dictionary)
    }

    /// Swaps the layout used for proximity typos and gesture decoding.
    pub fn set_layout(&mut self, layout: KeyboardLayout) {
        let layout = Arc::new(layout);
        self.typos = TypoGenerator::new(layout.clone());
        self.gesture = GestureDecoder::with_settings(
            layout.clone(),
            self.config.gesture.min_points,
            self.config.gesture.min_sample_distance,
        );
        self.layout = layout;
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    /// Forgets everything learned, back to the bootstrap vocabulary.
    pub fn clear_all_data(&mut self) {
        self.index = WordIndex::new();
        self.context_model = ContextModel::new(self.config.context.max_contexts);
        self.usage = UsageStats::default();
        self.user_words.clear();
        self.suppressed.clear();
        self.seed_bootstrap();
        self.flush();
        info!("learning data cleared");
    }

    /// Queues a snapshot of the current state for writing.
    pub fn flush(&mut self) {
        let snapshot = self.snapshot();
        self.scheduler.submit(snapshot);
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            words: self.index.len(),
            user_words: self.user_words.len(),
            bigram_contexts: self.context_model.bigram_count(),
            trigram_contexts: self.context_model.trigram_count(),
        }
    }

    pub fn word_index(&self) -> &WordIndex {
        &self.index
    }

    pub fn context_model(&self) -> &ContextModel {
        &self.context_model
    }

    fn persist(&mut self, event: LearningEvent) {
        if self.scheduler.record(event) {
            self.flush();
        }
    }

    /// Copies everything that gets persisted; the writer thread never
    /// touches live state.
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            user_words: self.user_words.clone(),
            ngram_blob: self.context_model.serialize(),
            entries: self
                .index
                .entries()
                .into_iter()
                .filter(|e| e.origin != WordOrigin::Bootstrap || e.frequency > 1)
                .collect(),
        }
    }
}

impl Drop for ImeEngine {
    fn drop(&mut self) {
        if self.scheduler.is_dirty() {
            self.flush();
        }
    }
}
