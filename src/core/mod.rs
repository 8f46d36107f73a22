// File: src/core/mod.rs
pub mod context;
pub mod engine;
pub mod layout;
pub mod ranker;
pub mod tokenizer;
pub mod trie;
pub mod types;
