use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::detection::DevicePreference;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "FRAMELABEL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("model path is empty")]
    EmptyModelPath,
    #[error("model.intra_threads must be greater than zero")]
    ZeroThreads,
}

fn default_http_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// Request body limit. Uploads over it fail as processing errors, the one
    /// size bound beyond what image decoding itself rejects.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_intra_threads() -> usize {
    4
}

fn default_labels_output() -> String {
    "labels".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Local file path or http(s) URL of the ONNX model.
    pub path: String,
    #[serde(default)]
    pub device: DevicePreference,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    /// Name of the int64 output holding per-detection label IDs.
    #[serde(default = "default_labels_output")]
    pub labels_output: String,
    /// One category name per line; the built-in COCO table is used when unset.
    #[serde(default)]
    pub categories_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    pub model: ModelConfig,
}

impl Config {
    /// Loads from `$FRAMELABEL_CONFIG`, falling back to `config.toml`.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        tracing::info!(path = %path, "loading config");
        Self::load_from(path)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;

        if config.model.path.trim().is_empty() {
            return Err(ConfigError::EmptyModelPath);
        }
        if config.model.intra_threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }

        Ok(config)
    }
}
