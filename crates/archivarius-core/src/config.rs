//! Configuration module

use crate::builder::{BuildOptions, Compression};
use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Archive creation settings
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// HTTP service settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Archive creation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Entry compression: deflated or stored
    #[serde(default)]
    pub compression: Compression,
    /// Deflate level (0-9), library default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl ArchiveConfig {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            compression: self.compression,
            level: self.level,
        }
    }
}

/// HTTP service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Background jobs allowed to run at once (0 = unbounded)
    pub max_concurrent_jobs: usize,
    /// Largest accepted request body, e.g. "64KiB"
    pub max_request_body: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            max_concurrent_jobs: 8,
            max_request_body: "1MiB".to_string(),
        }
    }
}

impl ServerConfig {
    /// Request body limit in bytes
    pub fn max_request_body_bytes(&self) -> Result<usize> {
        parse_size(&self.max_request_body).map(|n| n as usize)
    }
}

/// Parse size string like "100MiB" to bytes
pub fn parse_size(size_str: &str) -> Result<u64> {
    let size_str = size_str.trim();
    let split_pos = size_str
        .chars()
        .position(|c| !c.is_ascii_digit() && c != '.')
        .unwrap_or(size_str.len());

    if split_pos == 0 {
        return Err(Error::Config(format!("Invalid size format: {}", size_str)));
    }

    let (number_part, unit_part) = size_str.split_at(split_pos);
    let number: f64 = number_part
        .parse()
        .map_err(|_| Error::Config(format!("Invalid number in size: {}", number_part)))?;

    let multiplier: u64 = match unit_part.trim().to_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "m" | "mb" => 1_000_000,
        "g" | "gb" => 1_000_000_000,
        "ki" | "kib" => 1_024,
        "mi" | "mib" => 1_048_576,
        "gi" | "gib" => 1_073_741_824,
        _ => return Err(Error::Config(format!("Unknown size unit: {}", unit_part))),
    };

    Ok((number * multiplier as f64) as u64)
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        let app_dir = config_dir.join("archivarius");
        if !app_dir.exists() {
            fs::create_dir_all(&app_dir).map_err(|e| {
                Error::Config(format!("Unable to create {}: {}", app_dir.display(), e))
            })?;
        }

        Ok(app_dir.join("config.toml"))
    }

    /// Get default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# Archivarius Configuration File

[archive]
# Entry compression: deflated, stored
compression = "deflated"
# Deflate level (0-9); leave unset for the library default
# level = 6

[server]
# Address the HTTP service listens on
bind = "127.0.0.1:8080"
# Background jobs allowed to run at once (0 = unbounded)
max_concurrent_jobs = 8
# Largest accepted request body
max_request_body = "1MiB"
"#
        .to_string()
    }

    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            fs::write(&path, Self::default_config_content()).map_err(|e| {
                Error::Config(format!("Unable to write {}: {}", path.display(), e))
            })?;
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Unable to read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating its parent directories
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Unable to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Unable to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Load configuration or use defaults if loading fails
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if let Some(level) = self.archive.level {
            if level > 9 {
                return Err(Error::Config(format!(
                    "Compression level must be 0-9, got {}",
                    level
                )));
            }
        }
        self.server.max_request_body_bytes()?;
        Ok(())
    }
}
