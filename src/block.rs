//! Block structure and validation
//!
//! A block is a signed header over a list of batches. The hex signature over
//! the header is the block id, so a block id is always a 128-character hex
//! string. Block 0 is the genesis block and links to [`NULL_BLOCK_ID`].

use crate::batch::Batch;
use crate::crypto::{self, KeyPair};
use crate::error::{ChainError, Result};
use crate::transaction::short_id;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The previous-block id of the genesis block: all zeroes, the same width as
/// a real block id.
pub const NULL_BLOCK_ID: &str = "0000000000000000000000000000000000000000000000000000000000000000\
0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_num: u64,
    pub previous_block_id: String,
    /// Compressed public key (hex) of the validator that published this block
    pub signer_public_key: String,
    /// Ids of the contained batches, in order
    pub batch_ids: Vec<String>,
    /// Name of the consensus algorithm in force when the block was published
    pub consensus: String,
    /// Commitment to the state after this block
    pub state_root_hash: String,
    /// Unix timestamp (seconds) of publication
    pub timestamp: i64,
}

impl BlockHeader {
    pub fn signable_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    /// Hex compact signature over the header; doubles as the block id
    pub header_signature: String,
    pub batches: Vec<Batch>,
}

impl Block {
    /// Builds and signs a block from already-validated batches.
    pub fn create(
        block_num: u64,
        previous_block_id: &str,
        previous_state_root: &str,
        consensus: &str,
        batches: Vec<Batch>,
        signer: &KeyPair,
    ) -> Result<Self> {
        let batch_ids: Vec<String> = batches.iter().map(|b| b.id().to_string()).collect();
        let header = BlockHeader {
            block_num,
            previous_block_id: previous_block_id.to_string(),
            signer_public_key: signer.public_key_hex(),
            batch_ids,
            consensus: consensus.to_string(),
            state_root_hash: state_root(previous_state_root, &batches),
            timestamp: chrono::Utc::now().timestamp(),
        };
        let header_signature = signer.sign(&header.signable_bytes()?)?;

        Ok(Block {
            header,
            header_signature,
            batches,
        })
    }

    /// The block id: the hex signature over the header.
    pub fn id(&self) -> &str {
        &self.header_signature
    }

    pub fn num(&self) -> u64 {
        self.header.block_num
    }

    pub fn is_genesis(&self) -> bool {
        self.header.block_num == 0
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.batches.iter().map(|b| b.transaction_count()).sum()
    }

    /// Checks the block in isolation: signature, batch id list, and every
    /// contained batch. Linkage against the chain head is checked in
    /// [`crate::chain`].
    pub fn validate(&self) -> Result<()> {
        crypto::verify_signature(
            &self.header.signer_public_key,
            &self.header.signable_bytes()?,
            &self.header_signature,
        )
        .map_err(|e| {
            ChainError::InvalidBlock(format!(
                "Bad signature on block {}: {}",
                short_id(&self.header_signature),
                e
            ))
        })?;

        if self.header.batch_ids.len() != self.batches.len() {
            return Err(ChainError::InvalidBlock(format!(
                "Block {} lists {} batch ids but contains {} batches",
                self.header.block_num,
                self.header.batch_ids.len(),
                self.batches.len()
            )));
        }
        for (listed_id, batch) in self.header.batch_ids.iter().zip(&self.batches) {
            if listed_id != batch.id() {
                return Err(ChainError::InvalidBlock(format!(
                    "Block {} batch order mismatch: listed {} but found {}",
                    self.header.block_num,
                    short_id(listed_id),
                    short_id(batch.id())
                )));
            }
            batch.validate()?;
        }

        if self.is_genesis() && self.header.previous_block_id != NULL_BLOCK_ID {
            return Err(ChainError::InvalidBlock(
                "Genesis block must link to the null block id".to_string(),
            ));
        }

        Ok(())
    }
}

/// State commitment: hash of the previous root chained with the batch ids.
pub fn state_root(previous_root: &str, batches: &[Batch]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous_root.as_bytes());
    for batch in batches {
        hasher.update(batch.id().as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{is_hex_id, SIGNATURE_HEX_LEN};
    use crate::transaction::{Transaction, TransactionSpec};

    fn make_batch(keypair: &KeyPair, payload: &[u8]) -> Batch {
        let txn = Transaction::create(
            TransactionSpec {
                family_name: "smallbank".to_string(),
                family_version: "1.0".to_string(),
                inputs: vec!["332514aa".to_string()],
                outputs: vec!["332514aa".to_string()],
                payload: payload.to_vec(),
            },
            keypair,
            &keypair.public_key_hex(),
        )
        .unwrap();
        Batch::create(vec![txn], keypair).unwrap()
    }

    #[test]
    fn test_block_id_is_128_hex_chars() {
        let keypair = KeyPair::generate();
        let batches = vec![make_batch(&keypair, b"one")];
        let block = Block::create(0, NULL_BLOCK_ID, "", "devmode", batches, &keypair).unwrap();

        assert_eq!(block.id().len(), 128);
        assert!(is_hex_id(block.id(), SIGNATURE_HEX_LEN));
    }

    #[test]
    fn test_null_block_id_width_matches_real_ids() {
        assert_eq!(NULL_BLOCK_ID.len(), SIGNATURE_HEX_LEN);
    }

    #[test]
    fn test_counts() {
        let keypair = KeyPair::generate();
        let batches = vec![make_batch(&keypair, b"one"), make_batch(&keypair, b"two")];
        let block = Block::create(0, NULL_BLOCK_ID, "", "devmode", batches, &keypair).unwrap();

        assert_eq!(block.batch_count(), 2);
        assert_eq!(block.transaction_count(), 2);
        assert!(block.is_genesis());
        assert!(block.validate().is_ok());
    }

    #[test]
    fn test_tampered_header_rejected() {
        let keypair = KeyPair::generate();
        let batches = vec![make_batch(&keypair, b"one")];
        let mut block =
            Block::create(0, NULL_BLOCK_ID, "", "devmode", batches, &keypair).unwrap();
        block.header.consensus = "poet".to_string();

        assert!(block.validate().is_err());
    }

    #[test]
    fn test_genesis_must_link_to_null_id() {
        let keypair = KeyPair::generate();
        let batches = vec![make_batch(&keypair, b"one")];
        let block = Block::create(0, "ff", "", "devmode", batches, &keypair).unwrap();

        let err = block.validate().unwrap_err();
        assert!(err.to_string().contains("null block id"));
    }

    #[test]
    fn test_state_root_depends_on_batches() {
        let keypair = KeyPair::generate();
        let a = vec![make_batch(&keypair, b"one")];
        let b = vec![make_batch(&keypair, b"two")];
        assert_ne!(state_root("", &a), state_root("", &b));
        assert_eq!(state_root("", &a), state_root("", &a));
    }
}
