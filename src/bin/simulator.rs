// File: src/bin/simulator.rs
//! Interactive terminal keyboard for trying the engine by hand.
use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use keyboard_core::core::tokenizer::is_sentence_punctuation;
use keyboard_core::{EngineConfig, FileStore, GesturePath, ImeEngine, KeyboardLayout};
use std::io::{stdin, stdout, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Interpolated samples between two consecutive keys of a simulated swipe.
const SWIPE_STEPS: usize = 4;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::load()?;
    let store = FileStore::open(&config.persistence.storage_dir)?;
    let mut engine = ImeEngine::builder()
        .config(config)
        .storage(Arc::new(store))
        .build()?;

    let mut context = String::new();
    let mut preedit = String::new();
    let mut notice = String::new();

    loop {
        let suggestions = engine.get_suggestions(non_empty(&preedit), non_empty(&context));
        print_ui(&engine, &context, &preedit, &suggestions, &notice)?;
        notice.clear();

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let cmd = input.trim_end_matches(&['\r', '\n'][..]);

        match cmd {
            "exit" => break,
            "" => {
                if let Some(top) = suggestions.first() {
                    commit(&mut engine, &mut context, top);
                    preedit.clear();
                } else if !preedit.is_empty() {
                    let word = std::mem::take(&mut preedit);
                    commit(&mut engine, &mut context, &word);
                }
            }
            s if s.starts_with(":add ") => {
                engine.add_to_user_dictionary(&s[5..]);
                notice = format!("added '{}' to the user dictionary", s[5..].trim());
            }
            s if s.starts_with(":rm ") => {
                engine.remove_word(&s[4..]);
                notice = format!("removed '{}'", s[4..].trim());
            }
            s if s.starts_with(":swipe ") => {
                let path = simulate_swipe(engine.layout(), s[7..].trim());
                let dictionary: Vec<String> = engine.word_index().entries().into_iter().map(|e| e.text).collect();
                let decoded = engine.decode_gesture(&path, &dictionary);
                notice = format!("swipe decoded as {:?}", decoded.iter().take(5).collect::<Vec<_>>());
                if let Some(best) = decoded.first() {
                    commit(&mut engine, &mut context, best);
                    preedit.clear();
                }
            }
            s if s.starts_with(':') && s.len() > 1 => match s[1..].parse::<usize>() {
                Ok(n) if n > 0 && n <= suggestions.len() => {
                    commit(&mut engine, &mut context, &suggestions[n - 1]);
                    preedit.clear();
                }
                _ => notice = format!("no suggestion {}", &s[1..]),
            },
            s => {
                preedit.push_str(s);
                // Everything up to the last space is finished text.
                if let Some((done, rest)) = preedit.rsplit_once(' ') {
                    let (done, rest) = (done.to_string(), rest.to_string());
                    for word in done.split_whitespace() {
                        commit(&mut engine, &mut context, word);
                    }
                    preedit = rest;
                }
            }
        }
    }

    engine.flush();
    println!("\n{}", "Learning data saved.".green());
    Ok(())
}

fn commit(engine: &mut ImeEngine, context: &mut String, text: &str) {
    if text.contains(' ') {
        for part in text.split_whitespace() {
            commit(engine, context, part);
        }
        return;
    }
    if is_sentence_punctuation(text) {
        let trimmed_len = context.trim_end().len();
        context.truncate(trimmed_len);
        context.push_str(text);
        if matches!(text, "." | "!" | "?") {
            engine.learn_sentence(context.as_str());
            context.clear();
            return;
        }
        context.push(' ');
        return;
    }
    engine.learn_word(text);
    context.push_str(text);
    context.push(' ');
}

/// A straight-line swipe through the centre of each key of `word`.
fn simulate_swipe(layout: &KeyboardLayout, word: &str) -> GesturePath {
    let mut path = GesturePath::starting_at(0);
    let keys: Vec<_> = word.chars().filter_map(|c| layout.position(c)).collect();
    let mut t = 0;
    for pair in keys.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        for step in 0..SWIPE_STEPS {
            let f = step as f32 / SWIPE_STEPS as f32;
            path.add_point_at(from.x + (to.x - from.x) * f, from.y + (to.y - from.y) * f, t);
            t += 10;
        }
    }
    if let Some(last) = keys.last() {
        path.add_point_at(last.x, last.y, t);
    }
    path.finish();
    path
}

fn print_ui(engine: &ImeEngine, context: &str, preedit: &str, suggestions: &[String], notice: &str) -> Result<()> {
    let mut out = stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    println!("{}", "Predictive Keyboard Simulator".bold());
    println!("---------------------------------------------------------------");
    println!("Type text and press [Enter]. An empty line commits the top suggestion.");
    println!("':1' ':2' pick a suggestion, ':add w' ':rm w' edit the dictionary,");
    println!("':swipe word' simulates a swipe, 'exit' saves and quits.\n");

    let stats = engine.stats();
    println!(
        "{}",
        format!(
            "words: {}  user words: {}  bigram contexts: {}  trigram contexts: {}",
            stats.words, stats.user_words, stats.bigram_contexts, stats.trigram_contexts
        )
        .dark_grey()
    );
    println!("\nContext:  {}", context.cyan());
    println!("Pre-edit: [{}]", preedit.yellow());

    if suggestions.is_empty() {
        println!("\nNo suggestions.");
    } else {
        println!("\nSuggestions:");
        for (i, word) in suggestions.iter().enumerate() {
            println!("  :{}: {}", i + 1, word.as_str().green());
        }
    }
    if !notice.is_empty() {
        println!("\n{}", notice.magenta());
    }
    print!("\n> ");
    out.flush()?;
    Ok(())
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}
