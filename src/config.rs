//! Configuration for the query router host
//!
//! Loaded from a TOML file. Secrets never live in the file: each section names
//! the environment variable that holds its API key, resolved at bootstrap.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Files tried, in order, when no path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["query-router.toml", "config/query-router.toml"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRouterConfig {
    pub llm: LlmSection,
    #[serde(default)]
    pub retrieval: RetrievalSection,
    #[serde(default)]
    pub search: SearchSection,
}

/// Generation model settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Provider name; any OpenAI-compatible endpoint uses "openai"
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Environment variable containing API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
    /// Override for the chat completions base URL
    pub base_url: Option<String>,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Optional max tokens
    pub max_tokens: Option<u32>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

/// Local document corpus settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalSection {
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,
    /// File extension of corpus documents
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Excerpts requested per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Web search fallback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchSection {
    #[serde(default = "default_search_api_key_env")]
    pub api_key_env: String,
    pub base_url: Option<String>,
    /// Results requested from the search API per call (1 to 20)
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Model turns allowed before the search loop gives up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_extension() -> String {
    "txt".to_string()
}

fn default_top_k() -> usize {
    crate::handlers::DEFAULT_TOP_K
}

fn default_search_api_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_max_iterations() -> usize {
    5
}

fn default_search_timeout_secs() -> u64 {
    30
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            extension: default_extension(),
            top_k: default_top_k(),
        }
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            api_key_env: default_search_api_key_env(),
            base_url: None,
            max_results: default_max_results(),
            max_iterations: default_max_iterations(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

impl LlmSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SearchSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("No configuration file found (tried {0})")]
    NotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl QueryRouterConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: QueryRouterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// First existing file among `candidates`
    pub fn find_config_file<P: AsRef<Path>>(candidates: &[P]) -> Result<PathBuf, ConfigError> {
        candidates
            .iter()
            .map(|p| p.as_ref())
            .find(|p| p.exists())
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                let tried: Vec<String> = candidates
                    .iter()
                    .map(|p| p.as_ref().display().to_string())
                    .collect();
                ConfigError::NotFound(tried.join(", "))
            })
    }

    /// Reject values the runtime cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.provider != "openai" {
            return Err(ConfigError::InvalidConfig(format!(
                "Unsupported LLM provider '{}' (only \"openai\" is supported)",
                self.llm.provider
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidConfig(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs must be at least 1"));
        }
        if self.retrieval.top_k == 0 {
            return Err(invalid("retrieval.top_k must be at least 1"));
        }
        if self.retrieval.extension.trim_start_matches('.').is_empty() {
            return Err(invalid("retrieval.extension must not be empty"));
        }
        if !(1..=20).contains(&self.search.max_results) {
            return Err(ConfigError::InvalidConfig(format!(
                "search.max_results must be between 1 and 20, got {}",
                self.search.max_results
            )));
        }
        if self.search.max_iterations == 0 {
            return Err(invalid("search.max_iterations must be at least 1"));
        }
        if self.search.timeout_secs == 0 {
            return Err(invalid("search.timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// Helper method to get environment variable with error propagation
    fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(env_var_name.to_string()))
    }

    /// Get LLM API key from environment variable
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.llm.api_key_env)
    }

    /// Get search API key from environment variable
    pub fn get_search_api_key(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.search.api_key_env)
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfig(message.to_string())
}
