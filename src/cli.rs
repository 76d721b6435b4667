//! CLI helpers shared by the binaries

use crate::block::Block;
use crate::config::{load_config, Config};
use crate::crypto::KeyPair;
use crate::error::Result;
use crate::keyfile::KeyFile;
use crate::persistence::SqliteBlockStore;
use std::path::Path;

/// Column headers of `palisade-block list`, in print order.
pub const BLOCK_LIST_HEADER: [&str; 5] = ["NUM", "BLOCK_ID", "BATS", "TXNS", "SIGNER"];

/// Loads the config and opens the block store it points at, creating the data
/// directory on first use.
pub fn open_store_from_config() -> Result<(Config, SqliteBlockStore)> {
    let config = load_config()?;
    if let Some(parent) = Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = SqliteBlockStore::open(&config.database.path)?;
    Ok((config, store))
}

/// Loads a named signing key, falling back to the configured default name.
pub fn load_signing_key(config: &Config, name: Option<&str>) -> Result<KeyPair> {
    let name = name.unwrap_or(&config.keys.default_name);
    let keyfile = KeyFile::load(&config.key_dir()?, name)?;
    keyfile.keypair()
}

/// Truncated signer display: the first 8 hex characters of the public key
/// followed by an ellipsis.
pub fn format_signer(public_key_hex: &str) -> String {
    if public_key_hex.len() > 8 {
        format!("{}...", &public_key_hex[..8])
    } else {
        public_key_hex.to_string()
    }
}

/// Renders the `block list` table: NUM BLOCK_ID BATS TXNS SIGNER, one row per
/// block in the given (newest-first) order. `limit` of 0 means no limit.
pub fn block_list_table(blocks: &[Block], limit: usize) -> String {
    let shown: &[Block] = if limit > 0 && limit < blocks.len() {
        &blocks[..limit]
    } else {
        blocks
    };

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(shown.len() + 1);
    rows.push(BLOCK_LIST_HEADER.iter().map(|s| s.to_string()).collect());
    for block in shown {
        rows.push(vec![
            block.num().to_string(),
            block.id().to_string(),
            block.batch_count().to_string(),
            block.transaction_count().to_string(),
            format_signer(&block.header.signer_public_key),
        ]);
    }
    columnize(&rows)
}

/// Left-aligned, space-padded columns with two-space gutters. The last column
/// is never padded, so lines carry no trailing whitespace.
pub fn columnize(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i + 1 == row.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:<width$}  ", cell, width = widths[i]));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
