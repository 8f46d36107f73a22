// File: src/persistence.rs
use crate::core::types::WordEntry;
use crate::error::Result;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const USER_WORDS_FILE: &str = "user_words.json";
const NGRAM_FILE: &str = "ngrams.txt";
const WORD_ENTRIES_FILE: &str = "words.bin";

/// The narrow storage interface the engine reads and writes through.
pub trait PersistencePort: Send + Sync {
    fn load_user_words(&self) -> Result<HashSet<String>>;
    fn save_user_words(&self, words: &HashSet<String>) -> Result<()>;
    fn load_ngram_blob(&self) -> Result<String>;
    fn save_ngram_blob(&self, blob: &str) -> Result<()>;

    /// Learned word frequencies. Stores that do not keep them start every
    /// session from the bootstrap vocabulary.
    fn load_word_entries(&self) -> Result<Vec<WordEntry>> {
        Ok(Vec::new())
    }

    fn save_word_entries(&self, _entries: &[WordEntry]) -> Result<()> {
        Ok(())
    }
}

/// Stores everything as files in one directory, replacing each file
/// atomically on write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if needed. Fails when it cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_atomic(&self, name: &str, write: impl FnOnce(&mut BufWriter<&NamedTempFile>) -> Result<()>) -> Result<()> {
        let temp_file = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(&temp_file);
            write(&mut writer)?;
            writer.flush()?;
        }
        temp_file.persist(self.dir.join(name)).map_err(|e| e.error)?;
        Ok(())
    }

    fn open_existing(&self, name: &str) -> Result<Option<File>> {
        match File::open(self.dir.join(name)) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl PersistencePort for FileStore {
    fn load_user_words(&self) -> Result<HashSet<String>> {
        match self.open_existing(USER_WORDS_FILE)? {
            Some(file) => Ok(serde_json::from_reader(BufReader::new(file))?),
            None => Ok(HashSet::new()),
        }
    }

    fn save_user_words(&self, words: &HashSet<String>) -> Result<()> {
        let mut sorted: Vec<&String> = words.iter().collect();
        sorted.sort();
        self.write_atomic(USER_WORDS_FILE, |w| Ok(serde_json::to_writer(w, &sorted)?))
    }

    fn load_ngram_blob(&self) -> Result<String> {
        match fs::read_to_string(self.dir.join(NGRAM_FILE)) {
            Ok(blob) => Ok(blob),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_ngram_blob(&self, blob: &str) -> Result<()> {
        self.write_atomic(NGRAM_FILE, |w| Ok(w.write_all(blob.as_bytes())?))
    }

    fn load_word_entries(&self) -> Result<Vec<WordEntry>> {
        match self.open_existing(WORD_ENTRIES_FILE)? {
            Some(file) => Ok(bincode::deserialize_from(BufReader::new(file))?),
            None => Ok(Vec::new()),
        }
    }

    fn save_word_entries(&self, entries: &[WordEntry]) -> Result<()> {
        self.write_atomic(WORD_ENTRIES_FILE, |w| Ok(bincode::serialize_into(w, entries)?))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    user_words: HashSet<String>,
    ngram_blob: String,
    entries: Vec<WordEntry>,
    writes: usize,
}

/// In-process store for hosts that persist elsewhere, and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Number of snapshot writes received so far.
    pub fn write_count(&self) -> usize {
        self.with(|s| s.writes)
    }
}

impl PersistencePort for MemoryStore {
    fn load_user_words(&self) -> Result<HashSet<String>> {
        Ok(self.with(|s| s.user_words.clone()))
    }

    fn save_user_words(&self, words: &HashSet<String>) -> Result<()> {
        self.with(|s| {
            s.user_words = words.clone();
            s.writes += 1;
        });
        Ok(())
    }

    fn load_ngram_blob(&self) -> Result<String> {
        Ok(self.with(|s| s.ngram_blob.clone()))
    }

    fn save_ngram_blob(&self, blob: &str) -> Result<()> {
        self.with(|s| s.ngram_blob = blob.to_string());
        Ok(())
    }

    fn load_word_entries(&self) -> Result<Vec<WordEntry>> {
        Ok(self.with(|s| s.entries.clone()))
    }

    fn save_word_entries(&self, entries: &[WordEntry]) -> Result<()> {
        self.with(|s| s.entries = entries.to_vec());
        Ok(())
    }
}

/// A point-in-time copy of everything that gets persisted.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub user_words: HashSet<String>,
    pub ngram_blob: String,
    pub entries: Vec<WordEntry>,
}

/// What just changed, as far as persistence is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningEvent {
    Input,
    Word,
    Sentence,
    UserDictionary,
    Removal,
}

/// How many cheap events may accumulate before a write is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    pub input_batch: u32,
    pub word_batch: u32,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self { input_batch: 5, word_batch: 10 }
    }
}

enum Command {
    Write(Box<Snapshot>),
    Shutdown,
}

/// Batches learning events and writes snapshots on a background thread, so
/// the caller only pays for taking the snapshot, never for the I/O.
pub struct PersistenceScheduler {
    policy: FlushPolicy,
    pending_inputs: u32,
    pending_words: u32,
    dirty: bool,
    sender: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl PersistenceScheduler {
    pub fn spawn(port: Arc<dyn PersistencePort>, policy: FlushPolicy) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("keyboard-persistence".into())
            .spawn(move || run_writer(port.as_ref(), receiver))?;
        Ok(Self {
            policy,
            pending_inputs: 0,
            pending_words: 0,
            dirty: false,
            sender,
            worker: Some(worker),
        })
    }

    /// Notes an event; returns true when a snapshot should be written now.
    pub fn record(&mut self, event: LearningEvent) -> bool {
        self.dirty = true;
        let due = match event {
            LearningEvent::Input => {
                self.pending_inputs += 1;
                self.pending_inputs >= self.policy.input_batch.max(1)
            }
            LearningEvent::Word => {
                self.pending_words += 1;
                self.pending_words >= self.policy.word_batch.max(1)
            }
            LearningEvent::Sentence | LearningEvent::UserDictionary | LearningEvent::Removal => true,
        };
        if due {
            self.pending_inputs = 0;
            self.pending_words = 0;
        }
        due
    }

    /// True when something changed since the last submitted snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Hands a snapshot to the writer thread.
    pub fn submit(&mut self, snapshot: Snapshot) {
        self.dirty = false;
        self.pending_inputs = 0;
        self.pending_words = 0;
        if self.sender.send(Command::Write(Box::new(snapshot))).is_err() {
            warn!("persistence worker is gone, snapshot dropped");
        }
    }
}

impl Drop for PersistenceScheduler {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("persistence worker panicked");
            }
        }
    }
}

fn run_writer(port: &dyn PersistencePort, receiver: Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        let Command::Write(mut snapshot) = command else {
            break;
        };
        // Only the newest queued snapshot is worth writing.
        let mut shutdown = false;
        while let Ok(next) = receiver.try_recv() {
            match next {
                Command::Write(newer) => snapshot = newer,
                Command::Shutdown => {
                    shutdown = true;
                    break;
                }
            }
        }
        write_snapshot(port, &snapshot);
        if shutdown {
            break;
        }
    }
    debug!("persistence worker stopped");
}

fn write_snapshot(port: &dyn PersistencePort, snapshot: &Snapshot) {
    if let Err(e) = port.save_user_words(&snapshot.user_words) {
        warn!(error = %e, "failed to save user words");
    }
    if let Err(e) = port.save_ngram_blob(&snapshot.ngram_blob) {
        warn!(error = %e, "failed to save n-gram data");
    }
    if let Err(e) = port.save_word_entries(&snapshot.entries) {
        warn!(error = %e, "failed to save word entries");
    }
    debug!(
        user_words = snapshot.user_words.len(),
        entries = snapshot.entries.len(),
        "snapshot written"
    );
}
