//! Configuration loading from purser.toml.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub model: ModelConfig,

    /// Tool-server processes to spawn and register, by alias.
    #[serde(default, rename = "tool_server")]
    pub tool_servers: Vec<ToolServerConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Model backend configuration.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Gemini API key. Falls back to the GEMINI_API_KEY environment
    /// variable when unset.
    pub api_key: Option<String>,

    /// Maximum tool rounds per run.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            max_rounds: default_max_rounds(),
        }
    }
}

/// One tool-server process.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolServerConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl From<ToolServerConfig> for mcp::ClientConfig {
    fn from(config: ToolServerConfig) -> Self {
        Self {
            name: config.name,
            command: config.command,
            args: config.args,
            env: config.env,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_rounds() -> usize {
    8
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the model API key from config or environment.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.model.api_key {
            return Ok(key.clone());
        }
        std::env::var("GEMINI_API_KEY").map_err(|_| ConfigError::MissingApiKey)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("API key not configured: set model.api_key or GEMINI_API_KEY")]
    MissingApiKey,
}
