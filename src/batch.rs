//! Batches: the unit of submission
//!
//! Clients never submit bare transactions. They wrap them in a batch, signed
//! by the batcher key every contained transaction already named in its header.
//! The batch is atomic: a block either carries all of its transactions or none.

use crate::crypto::{self, KeyPair};
use crate::error::{ChainError, Result};
use crate::transaction::{short_id, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchHeader {
    /// Compressed public key (hex) of the batcher
    pub signer_public_key: String,
    /// Ids of the contained transactions, in execution order
    pub transaction_ids: Vec<String>,
}

impl BatchHeader {
    pub fn signable_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub header: BatchHeader,
    /// Hex compact signature over the header; doubles as the batch id
    pub header_signature: String,
    pub transactions: Vec<Transaction>,
}

impl Batch {
    /// Wraps transactions into a signed batch. Every transaction must already
    /// name `batcher` as its batcher key.
    pub fn create(transactions: Vec<Transaction>, batcher: &KeyPair) -> Result<Self> {
        if transactions.is_empty() {
            return Err(ChainError::InvalidBatch(
                "A batch must contain at least one transaction".to_string(),
            ));
        }

        let batcher_public_key = batcher.public_key_hex();
        for txn in &transactions {
            if txn.header.batcher_public_key != batcher_public_key {
                return Err(ChainError::InvalidBatch(format!(
                    "Transaction {} names a different batcher key",
                    short_id(txn.id())
                )));
            }
        }

        let header = BatchHeader {
            signer_public_key: batcher_public_key,
            transaction_ids: transactions.iter().map(|t| t.id().to_string()).collect(),
        };
        let header_signature = batcher.sign(&header.signable_bytes()?)?;

        Ok(Batch {
            header,
            header_signature,
            transactions,
        })
    }

    /// The batch id: the hex signature over the header.
    pub fn id(&self) -> &str {
        &self.header_signature
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Checks the batch signature, the transaction id list, the batcher-key
    /// agreement, and every contained transaction.
    pub fn validate(&self) -> Result<()> {
        crypto::verify_signature(
            &self.header.signer_public_key,
            &self.header.signable_bytes()?,
            &self.header_signature,
        )
        .map_err(|e| {
            ChainError::InvalidBatch(format!(
                "Bad signature on batch {}: {}",
                short_id(&self.header_signature),
                e
            ))
        })?;

        if self.header.transaction_ids.len() != self.transactions.len() {
            return Err(ChainError::InvalidBatch(format!(
                "Batch {} lists {} transaction ids but contains {} transactions",
                short_id(&self.header_signature),
                self.header.transaction_ids.len(),
                self.transactions.len()
            )));
        }

        for (listed_id, txn) in self.header.transaction_ids.iter().zip(&self.transactions) {
            if listed_id != txn.id() {
                return Err(ChainError::InvalidBatch(format!(
                    "Batch {} transaction order mismatch: listed {} but found {}",
                    short_id(&self.header_signature),
                    short_id(listed_id),
                    short_id(txn.id())
                )));
            }
            if txn.header.batcher_public_key != self.header.signer_public_key {
                return Err(ChainError::InvalidBatch(format!(
                    "Transaction {} was not destined for this batcher",
                    short_id(txn.id())
                )));
            }
            txn.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SIGNATURE_HEX_LEN;
    use crate::transaction::TransactionSpec;

    fn make_txn(signer: &KeyPair, batcher: &KeyPair, payload: &[u8]) -> Transaction {
        Transaction::create(
            TransactionSpec {
                family_name: "smallbank".to_string(),
                family_version: "1.0".to_string(),
                inputs: vec!["332514aa".to_string()],
                outputs: vec!["332514aa".to_string()],
                payload: payload.to_vec(),
            },
            signer,
            &batcher.public_key_hex(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_validate() {
        let signer = KeyPair::generate();
        let batcher = KeyPair::generate();

        let txns = vec![
            make_txn(&signer, &batcher, b"one"),
            make_txn(&signer, &batcher, b"two"),
        ];
        let batch = Batch::create(txns, &batcher).unwrap();

        assert_eq!(batch.id().len(), SIGNATURE_HEX_LEN);
        assert_eq!(batch.transaction_count(), 2);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let batcher = KeyPair::generate();
        let err = Batch::create(Vec::new(), &batcher).unwrap_err();
        assert!(err.to_string().contains("at least one transaction"));
    }

    #[test]
    fn test_wrong_batcher_key_rejected() {
        let signer = KeyPair::generate();
        let batcher = KeyPair::generate();
        let other = KeyPair::generate();

        let txns = vec![make_txn(&signer, &batcher, b"one")];
        let err = Batch::create(txns, &other).unwrap_err();
        assert!(err.to_string().contains("different batcher key"));
    }

    #[test]
    fn test_reordered_transactions_rejected() {
        let signer = KeyPair::generate();
        let batcher = KeyPair::generate();

        let txns = vec![
            make_txn(&signer, &batcher, b"one"),
            make_txn(&signer, &batcher, b"two"),
        ];
        let mut batch = Batch::create(txns, &batcher).unwrap();
        batch.transactions.swap(0, 1);

        let err = batch.validate().unwrap_err();
        assert!(err.to_string().contains("order mismatch"));
    }

    #[test]
    fn test_dropped_transaction_rejected() {
        let signer = KeyPair::generate();
        let batcher = KeyPair::generate();

        let txns = vec![
            make_txn(&signer, &batcher, b"one"),
            make_txn(&signer, &batcher, b"two"),
        ];
        let mut batch = Batch::create(txns, &batcher).unwrap();
        batch.transactions.pop();

        let err = batch.validate().unwrap_err();
        assert!(err.to_string().contains("transaction ids but contains"));
    }
}
