//! Configuration management for Palisade

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyConfig {
    /// Directory holding key files; defaults to ~/.palisade/keys
    pub dir: Option<String>,
    #[serde(default = "default_key_name")]
    pub default_name: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        KeyConfig {
            dir: None,
            default_name: default_key_name(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_id")]
    pub network_id: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_db_path(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            network_id: default_network_id(),
        }
    }
}

impl Config {
    /// Resolved key directory.
    pub fn key_dir(&self) -> Result<PathBuf> {
        match &self.keys.dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => dirs::home_dir()
                .map(|home| home.join(".palisade").join("keys"))
                .ok_or_else(|| {
                    ChainError::ConfigError(
                        "Cannot determine home directory; set keys.dir in config.toml".to_string(),
                    )
                }),
        }
    }
}

/// Loads `config.toml` from the working directory, falling back to defaults
/// when the file is absent.
pub fn load_config() -> Result<Config> {
    load_config_from("config.toml")
}

pub fn load_config_from(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        Config {
            database: DatabaseConfig::default(),
            keys: KeyConfig {
                dir: None,
                default_name: default_key_name(),
            },
            network: NetworkConfig::default(),
        }
    } else {
        toml::from_str(&config_str)
            .map_err(|e| ChainError::ConfigError(format!("Failed to parse {}: {}", path, e)))?
    };

    if config.database.path.is_empty() {
        return Err(ChainError::ConfigError(
            "database.path must be set in config.toml".to_string(),
        ));
    }

    Ok(config)
}

fn default_db_path() -> String {
    "./data/palisade.db".to_string()
}

fn default_key_name() -> String {
    "validator".to_string()
}

fn default_network_id() -> String {
    "devnet".to_string()
}
