//! Palisade - A batch-oriented blockchain client
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger Structures
//! - [`transaction`] - Signed transactions and header validation
//! - [`batch`] - Batches of transactions signed by a batcher key
//! - [`block`] - Block structure, block ids, genesis detection
//!
//! ## Chain Management
//! - [`chain`] - Linkage validation, append rules, block publishing
//! - [`genesis`] - Genesis block construction and on-chain settings
//!
//! ## Cryptography
//! - [`crypto`] - Signatures and verification (secp256k1)
//!
//! ## State Management
//! - [`keyfile`] - Key files on disk
//! - [`persistence`] - Block store backends (SQLite, in-memory)
//!
//! ## Tooling
//! - [`workload`] - Deterministic transaction playlists for load testing
//!
//! ## Configuration & Utilities
//! - [`cli`] - CLI helpers shared by the binaries
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Structures
// ============================================================================
pub mod batch;
pub mod block;
pub mod transaction;

// ============================================================================
// Chain Management
// ============================================================================
pub mod chain;
pub mod genesis;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// State Management
// ============================================================================
pub mod keyfile;
pub mod persistence;

// ============================================================================
// Tooling
// ============================================================================
pub mod workload;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;
