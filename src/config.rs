// File: src/config.rs
use crate::error::Result;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "predictive-keyboard";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub suggestions: SuggestionConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl EngineConfig {
    /// Reads the config file if one exists, otherwise returns defaults.
    pub fn load() -> Result<Self> {
        let path = resolve_config_path();
        if path.exists() {
            return Self::from_file(&path);
        }
        debug!(path = %path.display(), "no config file, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

fn resolve_config_path() -> PathBuf {
    if let Ok(path) = env::var("KEYBOARD_CONFIG") {
        return PathBuf::from(path);
    }
    if let Some(base) = dirs::config_dir() {
        return base.join(APP_DIR).join("config.toml");
    }
    PathBuf::from("keyboard.toml")
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SuggestionConfig {
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    #[serde(default = "default_completion_limit")]
    pub completion_limit: usize,
    #[serde(default = "default_typo_max_distance")]
    pub typo_max_distance: usize,
    #[serde(default = "default_user_dictionary_boost")]
    pub user_dictionary_boost: u32,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            completion_limit: default_completion_limit(),
            typo_max_distance: default_typo_max_distance(),
            user_dictionary_boost: default_user_dictionary_boost(),
        }
    }
}

fn default_max_suggestions() -> usize {
    5
}

fn default_completion_limit() -> usize {
    5
}

fn default_typo_max_distance() -> usize {
    2
}

fn default_user_dictionary_boost() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ContextConfig {
    #[serde(default = "default_max_contexts")]
    pub max_contexts: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { max_contexts: default_max_contexts() }
    }
}

fn default_max_contexts() -> usize {
    crate::core::context::DEFAULT_MAX_CONTEXTS
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GestureConfig {
    #[serde(default = "default_min_points")]
    pub min_points: usize,
    #[serde(default = "default_min_sample_distance")]
    pub min_sample_distance: f32,
    #[serde(default = "default_key_width")]
    pub key_width: f32,
    #[serde(default = "default_key_height")]
    pub key_height: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_points: default_min_points(),
            min_sample_distance: default_min_sample_distance(),
            key_width: default_key_width(),
            key_height: default_key_height(),
        }
    }
}

fn default_min_points() -> usize {
    crate::gesture::MIN_POINTS
}

fn default_min_sample_distance() -> f32 {
    crate::gesture::MIN_SAMPLE_DISTANCE
}

fn default_key_width() -> f32 {
    crate::core::layout::DEFAULT_KEY_WIDTH
}

fn default_key_height() -> f32 {
    crate::core::layout::DEFAULT_KEY_HEIGHT
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PersistenceConfig {
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Input-learning calls batched before a write.
    #[serde(default = "default_input_batch")]
    pub input_batch: u32,
    /// Word-learning calls batched before a write.
    #[serde(default = "default_word_batch")]
    pub word_batch: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            input_batch: default_input_batch(),
            word_batch: default_word_batch(),
        }
    }
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_input_batch() -> u32 {
    5
}

fn default_word_batch() -> u32 {
    10
}
