// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration management for accessscan
//!
//! Values come from an optional TOML file overlaid with `ACCESSSCAN__`
//! environment variables (e.g. `ACCESSSCAN__SERVER__PORT=8080`).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::{ExternalEngine, NullEngine, RuleEngine};
use crate::error::Result;
use crate::store::{FileBackend, MemoryBackend, SqliteBackend, StorageBackend, StoreLimits};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "accessscan.toml";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Report store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Rule engine process
    #[serde(default)]
    pub engine: EngineConfig,

    /// Input limits
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Include error details and source chains in 500 responses
    #[serde(default)]
    pub expose_diagnostics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            expose_diagnostics: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_kind")]
    pub backend: StorageKind,

    /// JSON file path, or SQLite database path/URL
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_max_reports")]
    pub max_reports: usize,

    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_kind(),
            path: None,
            max_reports: default_max_reports(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_storage_kind() -> StorageKind {
    StorageKind::File
}

fn default_max_reports() -> usize {
    StoreLimits::default().max_reports
}

fn default_max_bytes() -> u64 {
    StoreLimits::default().max_bytes
}

impl StorageConfig {
    pub fn limits(&self) -> StoreLimits {
        StoreLimits {
            max_reports: self.max_reports,
            max_bytes: self.max_bytes,
        }
    }

    /// SQLite connection URL for the configured path
    pub fn sqlite_url(&self) -> String {
        match self.path.as_deref() {
            Some(p) if p.starts_with("sqlite:") => p.to_string(),
            Some(p) => format!("sqlite://{}", p),
            None => "sqlite://accessscan.db".to_string(),
        }
    }

    /// Construct the configured backend; it still has to be opened
    pub fn backend(&self) -> Box<dyn StorageBackend> {
        match self.backend {
            StorageKind::Memory => Box::new(MemoryBackend::new()),
            StorageKind::Sqlite => Box::new(SqliteBackend::new(self.sqlite_url())),
            StorageKind::File => {
                let path = self
                    .path
                    .as_ref()
                    .map(PathBuf::from)
                    .unwrap_or_else(FileBackend::default_path);
                Box::new(FileBackend::new(path))
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    /// Engine executable; without one only the built-in checks run
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineConfig {
    pub fn build(&self) -> Arc<dyn RuleEngine> {
        match &self.command {
            Some(command) if !command.trim().is_empty() => {
                Arc::new(ExternalEngine::new(command.clone(), self.args.clone()))
            }
            _ => {
                tracing::debug!("No rule engine configured, running built-in checks only");
                Arc::new(NullEngine)
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> u64 {
    1024 * 1024
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file {} not found, using defaults", path.display());
        }

        let builder = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("ACCESSSCAN")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let parsed: Config = config.try_deserialize()?;

        Ok(parsed)
    }
}
