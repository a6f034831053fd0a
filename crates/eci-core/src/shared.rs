//! Shared types used across all ECI crates.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for session ids minted by the gateway when the client sends none.
pub const DEFAULT_SESSION_PREFIX: &str = "sess-";

/// Global application configuration (gateway + answer backend). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity shown by the status endpoint.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for Sled DBs (the conversation log path is derived from this).
    pub storage_path: String,
    /// Answer backend: "local" (offline matcher) or "agent" (managed agent over HTTP).
    pub answer_mode: String,

    /// Optional JSON catalog replacing the built-in ECI knowledge base.
    #[serde(default)]
    pub catalog_path: Option<String>,
    /// Enables the word-overlap stage between keyword and similarity matching.
    #[serde(default)]
    pub word_overlap_fallback: bool,
    /// Minimum similarity score accepted by the resolver.
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    /// Delay between word chunks when the chat endpoint streams.
    #[serde(default = "default_stream_delay_ms")]
    pub stream_delay_ms: u64,

    /// Managed agent invocation URL (answer_mode = "agent").
    #[serde(default)]
    pub agent_endpoint: Option<String>,
    /// Bearer token sent to the managed agent.
    #[serde(default)]
    pub agent_token: Option<String>,
    /// CORS origins allowed by the gateway. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_threshold() -> f64 {
    crate::knowledge::DEFAULT_THRESHOLD
}

fn default_stream_delay_ms() -> u64 {
    40
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "ECI Knowledge Assistant".to_string(),
            port: 8001,
            storage_path: "./data".to_string(),
            answer_mode: "local".to_string(),
            catalog_path: None,
            word_overlap_fallback: false,
            similarity_threshold: default_threshold(),
            stream_delay_ms: default_stream_delay_ms(),
            agent_endpoint: None,
            agent_token: None,
            allowed_origins: Vec::new(),
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `ECI_*` > file named by
    /// `ECI_CONFIG` (default `config/gateway`, any supported extension) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("ECI_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        Self::build(Some(config::File::with_name(&config_path).required(false)), None)
    }

    /// Same as [`CoreConfig::load`] with an explicit (optional) TOML file.
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::build(file.map(config::File::from), None)
    }

    /// `env` replaces the process environment when set.
    fn build(
        file: Option<config::File<config::FileSourceFile, config::FileFormat>>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("storage_path", defaults.storage_path)?
            .set_default("answer_mode", defaults.answer_mode)?
            .set_default("word_overlap_fallback", defaults.word_overlap_fallback)?
            .set_default("similarity_threshold", defaults.similarity_threshold)?
            .set_default("stream_delay_ms", defaults.stream_delay_ms as i64)?;

        let builder = match file {
            Some(source) => builder.add_source(source),
            None => builder,
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("ECI")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let cfg: Self = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(config::ConfigError::Message(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }

    /// Sled path of the conversation log.
    pub fn conversation_path(&self) -> std::path::PathBuf {
        Path::new(&self.storage_path).join("eci_conversations")
    }
}
