// File: src/bin/main.rs
//! Line protocol host: one command per line on stdin, one reply per line on
//! stdout. Logs go to stderr.
use anyhow::{Context, Result};
use keyboard_core::{EngineConfig, FileStore, ImeEngine};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(io::stderr)
        .init();

    let config = EngineConfig::load()?;
    let storage_dir = config.persistence.storage_dir.clone();
    let store = FileStore::open(&storage_dir)
        .with_context(|| format!("cannot open storage at {}", storage_dir.display()))?;
    info!(storage = %storage_dir.display(), "starting keyboard engine");

    let mut engine = ImeEngine::builder()
        .config(config)
        .storage(Arc::new(store))
        .build()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let input = line?;
        debug!(?input, "command received");
        if !handle_command(&input, &mut engine, &mut stdout)? {
            break;
        }
        stdout.flush()?;
    }

    engine.flush();
    info!("keyboard engine shutting down");
    Ok(())
}

/// Runs one command. Returns false on `EXIT`.
fn handle_command(input: &str, engine: &mut ImeEngine, out: &mut impl Write) -> io::Result<bool> {
    let (command, argument) = input.split_once(' ').unwrap_or((input, ""));
    match command {
        "SUGGEST" => {
            let (current, context) = argument.split_once('\t').unwrap_or((argument, ""));
            let suggestions = engine.get_suggestions(non_empty(current), non_empty(context));
            writeln!(out, "SUGGESTIONS\t{}", suggestions.join("\t"))?;
        }
        "LEARN" => {
            engine.learn_from_input(argument);
            writeln!(out, "OK")?;
        }
        "WORD" => {
            engine.learn_word(argument);
            writeln!(out, "OK")?;
        }
        "SENTENCE" => {
            engine.learn_sentence(argument);
            writeln!(out, "OK")?;
        }
        "ADD" => {
            engine.add_to_user_dictionary(argument);
            writeln!(out, "OK")?;
        }
        "REMOVE" => {
            engine.remove_word(argument);
            writeln!(out, "OK")?;
        }
        "STATS" => {
            let stats = engine.stats();
            writeln!(
                out,
                "STATS words={} user_words={} bigrams={} trigrams={}",
                stats.words, stats.user_words, stats.bigram_contexts, stats.trigram_contexts
            )?;
        }
        "EXIT" => return Ok(false),
        "" => {}
        other => {
            warn!(command = other, "unknown command");
            writeln!(out, "ERR unknown command")?;
        }
    }
    Ok(true)
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}
