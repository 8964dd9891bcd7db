//! Configuration module for the retrieval pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (applied by the command handlers)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CR_` and use double underscores
//! to separate nested levels:
//! - `CR_RETRIEVAL__NUM_THREADS=8` sets `retrieval.num_threads`
//! - `CR_ORACLE__MODEL=ollama:qwen2.5-coder` sets `oracle.model`
//! - `CR_REPOSITORY__SANITIZE_CONTENT=true` sets `repository.sanitize_content`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::chunking::ChunkingStrategy;
use crate::preview::PreviewKind;
use crate::retrieval::{FteStrategy, SnippetDeterminerKind, SnippetFinderKind};

/// Directory holding the workspace configuration.
pub const CONFIG_DIR: &str = ".coderecall";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "CR_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Where persisted keyword indices are stored
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Repository enumeration and exclusion rules
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Snippet chunking settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Keyword engine settings
    #[serde(default)]
    pub keyword: KeywordConfig,

    /// Retrieval pipeline budgets and strategies
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Language model backend used as decision oracle
    #[serde(default)]
    pub oracle: OracleConfig,

    /// File preview generation
    #[serde(default)]
    pub preview: PreviewConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RepositoryConfig {
    /// Files larger than this are never considered
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Directories holding more entries than this are skipped entirely
    #[serde(default = "default_max_files_per_directory")]
    pub max_files_per_directory: usize,

    /// Skip entries whose name starts with a dot
    #[serde(default = "default_true")]
    pub exclude_hidden: bool,

    /// Shell-style patterns of repository paths to exclude
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Mask emails, phone numbers and passwords when reading files
    #[serde(default = "default_false")]
    pub sanitize_content: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default)]
    pub strategy: ChunkingStrategy,

    /// Window size of the line-based chunker
    #[serde(default = "default_line_window")]
    pub line_window: usize,

    /// Byte budget of a syntax-aware chunk
    #[serde(default = "default_max_snippet_bytes")]
    pub max_snippet_bytes: usize,

    /// Chunks with fewer non-whitespace bytes are merged into their successor
    #[serde(default = "default_min_snippet_chars")]
    pub min_snippet_chars: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KeywordConfig {
    /// Longest n-gram produced by the tokenizer
    #[serde(default = "default_num_gram")]
    pub num_gram: usize,

    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f64,

    #[serde(default = "default_bm25_b")]
    pub bm25_b: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Similar files looked up per extracted file name
    #[serde(default = "default_edl_file_limit")]
    pub edl_file_limit: usize,

    /// Files taken from the keyword engine
    #[serde(default = "default_kws_file_limit")]
    pub kws_file_limit: usize,

    #[serde(default)]
    pub fte_strategy: FteStrategy,

    /// Levels to go up from each starting file before exploring
    #[serde(default = "default_fte_going_upward")]
    pub fte_going_upward: usize,

    /// Files the explorer may add
    #[serde(default = "default_fte_file_limit")]
    pub fte_file_limit: usize,

    /// Give up (or shrink) when the visible tree exceeds this many lines
    #[serde(default = "default_fte_max_file_tree_size")]
    pub fte_max_file_tree_size: usize,

    /// Minimum preview score (0..=3) for a file to be kept
    #[serde(default = "default_fps_preview_score_threshold")]
    pub fps_preview_score_threshold: u8,

    #[serde(default)]
    pub scr_snippet_finder: SnippetFinderKind,

    #[serde(default)]
    pub scr_snippet_determiner: SnippetDeterminerKind,

    /// Minimum snippet score (0..=3) for the scoring determiner
    #[serde(default = "default_scr_snippet_score_threshold")]
    pub scr_snippet_score_threshold: u8,

    /// Maximum lines of an enumerated snippet
    #[serde(default = "default_scr_snippet_size")]
    pub scr_snippet_size: usize,

    /// Threads used per file by the enumerative finder
    #[serde(default = "default_scr_num_threads")]
    pub scr_num_threads: usize,

    /// Worker threads for per-file stages
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OracleConfig {
    /// Backend in `provider:model` form, e.g. `openai:gpt-4o`
    #[serde(default = "default_oracle_model")]
    pub model: String,

    /// Override of the provider's endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per decision before falling back to the default answer
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PreviewConfig {
    #[serde(default)]
    pub kind: PreviewKind,

    /// Syntax nodes spanning more lines are outlined by their children
    #[serde(default = "default_preview_max_lines")]
    pub max_lines: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every target
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `oracle = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("coderecall"))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("cache"))
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_max_file_bytes() -> u64 {
    240_000
}
fn default_max_files_per_directory() -> usize {
    100
}
fn default_line_window() -> usize {
    15
}
fn default_max_snippet_bytes() -> usize {
    1500
}
fn default_min_snippet_chars() -> usize {
    100
}
fn default_num_gram() -> usize {
    3
}
fn default_bm25_k1() -> f64 {
    1.2
}
fn default_bm25_b() -> f64 {
    0.75
}
fn default_edl_file_limit() -> usize {
    10
}
fn default_kws_file_limit() -> usize {
    5
}
fn default_fte_going_upward() -> usize {
    2
}
fn default_fte_file_limit() -> usize {
    2
}
fn default_fte_max_file_tree_size() -> usize {
    1500
}
fn default_fps_preview_score_threshold() -> u8 {
    2
}
fn default_scr_snippet_score_threshold() -> u8 {
    1
}
fn default_scr_snippet_size() -> usize {
    100
}
fn default_scr_num_threads() -> usize {
    1
}
fn default_num_threads() -> usize {
    num_cpus::get().min(8)
}
fn default_oracle_model() -> String {
    "openai:gpt-4o".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_rounds() -> usize {
    10
}
fn default_preview_max_lines() -> usize {
    50
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache_dir: default_cache_dir(),
            repository: RepositoryConfig::default(),
            chunking: ChunkingConfig::default(),
            keyword: KeywordConfig::default(),
            retrieval: RetrievalConfig::default(),
            oracle: OracleConfig::default(),
            preview: PreviewConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_files_per_directory: default_max_files_per_directory(),
            exclude_hidden: true,
            excludes: Vec::new(),
            sanitize_content: false,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::default(),
            line_window: default_line_window(),
            max_snippet_bytes: default_max_snippet_bytes(),
            min_snippet_chars: default_min_snippet_chars(),
        }
    }
}

impl ChunkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.line_window == 0 {
            return Err("line_window must be greater than 0".to_string());
        }
        if self.min_snippet_chars >= self.max_snippet_bytes {
            return Err(format!(
                "min_snippet_chars ({}) must be less than max_snippet_bytes ({})",
                self.min_snippet_chars, self.max_snippet_bytes
            ));
        }
        Ok(())
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            num_gram: default_num_gram(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            edl_file_limit: default_edl_file_limit(),
            kws_file_limit: default_kws_file_limit(),
            fte_strategy: FteStrategy::default(),
            fte_going_upward: default_fte_going_upward(),
            fte_file_limit: default_fte_file_limit(),
            fte_max_file_tree_size: default_fte_max_file_tree_size(),
            fps_preview_score_threshold: default_fps_preview_score_threshold(),
            scr_snippet_finder: SnippetFinderKind::default(),
            scr_snippet_determiner: SnippetDeterminerKind::default(),
            scr_snippet_score_threshold: default_scr_snippet_score_threshold(),
            scr_snippet_size: default_scr_snippet_size(),
            scr_num_threads: default_scr_num_threads(),
            num_threads: default_num_threads(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: default_oracle_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_rounds: default_max_rounds(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            kind: PreviewKind::default(),
            max_lines: default_preview_max_lines(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting, single underscore stays in field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.coderecall/settings.toml` from the current directory upwards
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }

    /// Directory holding persisted keyword indices
    pub fn keyword_index_dir(&self) -> PathBuf {
        self.cache_dir.join("keyword_indices")
    }
}
