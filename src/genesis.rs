//! Genesis block construction and on-chain settings
//!
//! The genesis block (block 0) carries the chain's initial configuration as
//! ordinary transactions in the `settings` family. The most important entry is
//! the consensus algorithm selection, which is also lifted into the block
//! header so later blocks can inherit it without replaying the payloads.

use crate::batch::Batch;
use crate::block::{Block, NULL_BLOCK_ID};
use crate::crypto::{self, KeyPair};
use crate::error::Result;
use crate::transaction::{Transaction, TransactionSpec};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FAMILY: &str = "settings";
pub const SETTINGS_FAMILY_VERSION: &str = "1.0";
/// State namespace prefix reserved for settings
pub const SETTINGS_NAMESPACE: &str = "000000";

/// The setting that selects the consensus algorithm
pub const CONSENSUS_SETTING: &str = "palisade.consensus.algorithm.name";
pub const DEFAULT_CONSENSUS: &str = "devmode";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SettingsPayload {
    Set { key: String, value: String },
}

/// State address of a setting: the settings namespace prefix followed by the
/// first 64 hex characters of the SHA-256 of the key.
pub fn settings_address(key: &str) -> String {
    let digest = crypto::sha256_hex(key.as_bytes());
    format!("{}{}", SETTINGS_NAMESPACE, digest)
}

/// Builds a signed settings transaction.
pub fn settings_transaction(
    key: &str,
    value: &str,
    signer: &KeyPair,
) -> Result<Transaction> {
    let payload = SettingsPayload::Set {
        key: key.to_string(),
        value: value.to_string(),
    };
    let address = settings_address(key);
    Transaction::create(
        TransactionSpec {
            family_name: SETTINGS_FAMILY.to_string(),
            family_version: SETTINGS_FAMILY_VERSION.to_string(),
            inputs: vec![address.clone()],
            outputs: vec![address],
            payload: serde_json::to_vec(&payload)?,
        },
        signer,
        &signer.public_key_hex(),
    )
}

/// Builds the genesis block from a list of settings. The consensus setting is
/// added with its default value when absent, so every genesis block records
/// which algorithm the chain starts under.
pub fn build_genesis(settings: &[(String, String)], signer: &KeyPair) -> Result<Block> {
    let mut settings: Vec<(String, String)> = settings.to_vec();
    let consensus = match settings.iter().find(|(k, _)| k == CONSENSUS_SETTING) {
        Some((_, value)) => value.clone(),
        None => {
            settings.push((
                CONSENSUS_SETTING.to_string(),
                DEFAULT_CONSENSUS.to_string(),
            ));
            DEFAULT_CONSENSUS.to_string()
        }
    };

    let mut transactions = Vec::with_capacity(settings.len());
    for (key, value) in &settings {
        transactions.push(settings_transaction(key, value, signer)?);
    }
    let batch = Batch::create(transactions, signer)?;

    Block::create(0, NULL_BLOCK_ID, "", &consensus, vec![batch], signer)
}

/// Decodes the settings carried by a block, in payload order. Non-settings
/// transactions are skipped.
pub fn settings_in_block(block: &Block) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for batch in &block.batches {
        for txn in &batch.transactions {
            if txn.header.family_name != SETTINGS_FAMILY {
                continue;
            }
            let payload: SettingsPayload = serde_json::from_slice(&txn.payload)?;
            let SettingsPayload::Set { key, value } = payload;
            out.push((key, value));
        }
    }
    Ok(out)
}
