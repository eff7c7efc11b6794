use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default embedding model identifier sent to the provider.
pub const DEFAULT_EMBED_MODEL: &str = "codestral-embed";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Process-wide settings, resolved once at startup and passed into each
/// component at construction. Nothing reads the environment after this.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// API key for the embedding provider.
    pub embed_api_key: String,
    /// Base URL of the embedding provider.
    pub embed_base_url: String,
    /// Embedding model identifier.
    pub embed_model: String,
    /// API key for the vector index service.
    pub index_api_key: String,
    /// Data-plane host of the vector index.
    pub index_host: String,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in characters.
    pub chunk_overlap: usize,
    /// Maximum items per embedding batch.
    pub max_batch_size: usize,
    /// Maximum cumulative tokens per embedding batch.
    pub max_total_tokens: usize,
    /// Maximum tokens for a single item; longer items are truncated.
    pub max_sequence_length: usize,
    /// Pause inserted between successive embedding batches.
    pub batch_pause: Duration,
    /// Root directory for staged per-repository output.
    pub data_dir: PathBuf,
}

impl IndexerConfig {
    /// Builds the configuration from environment variables.
    ///
    /// `MISTRAL_API_KEY`, `PINECONE_API_KEY` and `PINECONE_INDEX_HOST` are
    /// required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            embed_api_key: require("MISTRAL_API_KEY")?,
            embed_base_url: optional("MISTRAL_BASE_URL", "https://api.mistral.ai"),
            embed_model: optional("EMBED_MODEL", DEFAULT_EMBED_MODEL),
            index_api_key: require("PINECONE_API_KEY")?,
            index_host: require("PINECONE_INDEX_HOST")?,
            chunk_size: numeric("CHUNK_SIZE", 3000)?,
            chunk_overlap: numeric("CHUNK_OVERLAP", 1000)?,
            max_batch_size: numeric("MAX_BATCH_SIZE", 128)?,
            max_total_tokens: numeric("MAX_TOTAL_TOKENS", 16384)?,
            max_sequence_length: numeric("MAX_SEQUENCE_LENGTH", 8192)?,
            batch_pause: Duration::from_secs(numeric("BATCH_PAUSE_SECS", 4)? as u64),
            data_dir: PathBuf::from(optional("DATA_DIR", "data")),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants the rest of the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sequence_length > self.max_total_tokens {
            return Err(ConfigError::Invalid(format!(
                "max_sequence_length ({}) must not exceed max_total_tokens ({})",
                self.max_sequence_length, self.max_total_tokens
            )));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn numeric(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> IndexerConfig {
        IndexerConfig {
            embed_api_key: "k".into(),
            embed_base_url: "http://localhost".into(),
            embed_model: DEFAULT_EMBED_MODEL.into(),
            index_api_key: "k".into(),
            index_host: "http://localhost".into(),
            chunk_size: 3000,
            chunk_overlap: 1000,
            max_batch_size: 128,
            max_total_tokens: 16384,
            max_sequence_length: 8192,
            batch_pause: Duration::ZERO,
            data_dir: PathBuf::from("data"),
        }
    }

    #[test]
    fn test_valid_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_sequence_length_must_fit_in_token_budget() {
        let mut config = base_config();
        config.max_sequence_length = config.max_total_tokens + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = base_config();
        config.chunk_overlap = config.chunk_size;
        assert!(config.validate().is_err());
    }
}
