//! Error types for Palisade

use std::fmt;

#[derive(Debug, Clone)]
pub enum ChainError {
    InvalidBlockLinkage(String),
    InvalidTransaction(String),
    InvalidBatch(String),
    InvalidBlock(String),
    CryptoError(String),
    DatabaseError(String),
    BlockNotFound(String),
    BlockAlreadyExists,
    GenesisExists,
    EmptyChain,
    KeyError(String),
    ConfigError(String),
    IoError(String),
    SerializationError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::InvalidBlockLinkage(msg) => write!(f, "Invalid block linkage: {}", msg),
            ChainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {}", msg),
            ChainError::InvalidBatch(msg) => write!(f, "Invalid batch: {}", msg),
            ChainError::InvalidBlock(msg) => write!(f, "Invalid block: {}", msg),
            ChainError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            ChainError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ChainError::BlockNotFound(msg) => write!(f, "Block not found: {}", msg),
            ChainError::BlockAlreadyExists => write!(f, "Block already exists"),
            ChainError::GenesisExists => write!(f, "Genesis block already exists"),
            ChainError::EmptyChain => write!(f, "Chain is empty; create a genesis block first"),
            ChainError::KeyError(msg) => write!(f, "Key error: {}", msg),
            ChainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ChainError::IoError(msg) => write!(f, "IO error: {}", msg),
            ChainError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for ChainError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
