// File: src/lib.rs
//! On-device predictive text: word completion, typo correction, next-word
//! and punctuation prediction, swipe decoding, and learning from what the
//! user types.

pub mod c_api;
pub mod config;
pub mod core;
pub mod error;
pub mod fuzzy;
pub mod gesture;
pub mod learning;
pub mod persistence;
pub mod providers;

pub use crate::config::EngineConfig;
pub use crate::core::engine::{EngineBuilder, EngineStats, ImeEngine};
pub use crate::core::layout::{KeyboardLayout, Script};
pub use crate::error::{EngineError, Result};
pub use crate::gesture::GesturePath;
pub use crate::persistence::{FileStore, MemoryStore, PersistencePort};
pub use crate::providers::{BootstrapProvider, SuggestionProvider};
