//! Key files on disk
//!
//! Keys live as JSON files under the configured key directory, one file per
//! named key (`<dir>/<name>.json`). The validator key signs blocks; batcher
//! keys sign batches. Both use the same file format.

use crate::crypto::KeyPair;
use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
    pub name: String,
    /// Compressed public key, hex
    pub public_key: String,
    pub secret_key_hex: String,
    pub created: String,
}

impl KeyFile {
    /// Generates a fresh key under the given name.
    pub fn generate(name: &str) -> Self {
        let keypair = KeyPair::generate();
        KeyFile {
            name: name.to_string(),
            public_key: keypair.public_key_hex(),
            secret_key_hex: keypair.secret_key_hex(),
            created: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn path_for(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.json", name))
    }

    /// Writes the key file, refusing to overwrite an existing key.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .map_err(|e| ChainError::KeyError(format!("Failed to create key dir: {}", e)))?;
        let path = Self::path_for(dir, &self.name);
        if path.exists() {
            return Err(ChainError::KeyError(format!(
                "Key '{}' already exists at {}",
                self.name,
                path.display()
            )));
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .map_err(|e| ChainError::KeyError(format!("Failed to write key file: {}", e)))?;
        Ok(path)
    }

    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        let path = Self::path_for(dir, name);
        let content = fs::read_to_string(&path).map_err(|e| {
            ChainError::KeyError(format!(
                "No key '{}' at {} ({}); run palisade-keygen first",
                name,
                path.display(),
                e
            ))
        })?;
        let keyfile: KeyFile = serde_json::from_str(&content)
            .map_err(|e| ChainError::KeyError(format!("Failed to parse key file: {}", e)))?;
        Ok(keyfile)
    }

    pub fn keypair(&self) -> Result<KeyPair> {
        let keypair = KeyPair::from_secret_hex(&self.secret_key_hex)?;
        if keypair.public_key_hex() != self.public_key {
            return Err(ChainError::KeyError(format!(
                "Key file '{}' is inconsistent: stored public key does not match the secret key",
                self.name
            )));
        }
        Ok(keypair)
    }
}
