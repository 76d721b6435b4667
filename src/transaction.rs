//! Transaction types and validation
//!
//! A transaction is a signed header plus an opaque payload. The header commits
//! to the payload through its SHA-512 digest and names the state addresses the
//! payload reads (`inputs`) and writes (`outputs`). The hex signature over the
//! header is the transaction id.

use crate::crypto::{self, KeyPair};
use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};

/// Maximum payload size in bytes (100KB) to prevent oversized transactions
pub const MAX_PAYLOAD_SIZE: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub family_name: String,
    pub family_version: String,
    /// State addresses the transaction reads
    pub inputs: Vec<String>,
    /// State addresses the transaction writes
    pub outputs: Vec<String>,
    pub nonce: String,
    /// Hex SHA-512 of the payload bytes
    pub payload_sha512: String,
    /// Compressed public key (hex) of the key that signed this header
    pub signer_public_key: String,
    /// Compressed public key (hex) of the key expected to sign the enclosing batch
    pub batcher_public_key: String,
}

impl TransactionHeader {
    /// Deterministic byte encoding used for signing and verification.
    pub fn signable_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub header: TransactionHeader,
    /// Hex compact signature over the header; doubles as the transaction id
    pub header_signature: String,
    pub payload: Vec<u8>,
}

/// Settings for building a transaction, everything except the keys.
#[derive(Debug, Clone)]
pub struct TransactionSpec {
    pub family_name: String,
    pub family_version: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Builds and signs a transaction. `signer` signs the header; `batcher`
    /// names the key that must later sign the batch containing it.
    pub fn create(
        spec: TransactionSpec,
        signer: &KeyPair,
        batcher_public_key: &str,
    ) -> Result<Self> {
        if spec.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ChainError::InvalidTransaction(format!(
                "Payload too large: {} bytes (max: {})",
                spec.payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let header = TransactionHeader {
            family_name: spec.family_name,
            family_version: spec.family_version,
            inputs: spec.inputs,
            outputs: spec.outputs,
            nonce: nonce(),
            payload_sha512: crypto::sha512_hex(&spec.payload),
            signer_public_key: signer.public_key_hex(),
            batcher_public_key: batcher_public_key.to_string(),
        };

        let header_signature = signer.sign(&header.signable_bytes()?)?;

        Ok(Transaction {
            header,
            header_signature,
            payload: spec.payload,
        })
    }

    /// The transaction id: the hex signature over the header.
    pub fn id(&self) -> &str {
        &self.header_signature
    }

    /// Checks the header signature and the payload digest.
    pub fn validate(&self) -> Result<()> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ChainError::InvalidTransaction(format!(
                "Payload too large: {} bytes (max: {})",
                self.payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let expected_digest = crypto::sha512_hex(&self.payload);
        if self.header.payload_sha512 != expected_digest {
            return Err(ChainError::InvalidTransaction(format!(
                "Payload digest mismatch for transaction {}",
                short_id(&self.header_signature)
            )));
        }

        crypto::verify_signature(
            &self.header.signer_public_key,
            &self.header.signable_bytes()?,
            &self.header_signature,
        )
        .map_err(|e| {
            ChainError::InvalidTransaction(format!(
                "Bad signature on transaction {}: {}",
                short_id(&self.header_signature),
                e
            ))
        })
    }
}

/// Abbreviates an id for error messages and logs.
pub fn short_id(id: &str) -> String {
    if id.len() > 8 {
        format!("{}...", &id[..8])
    } else {
        id.to_string()
    }
}

fn nonce() -> String {
    format!("{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SIGNATURE_HEX_LEN;

    fn test_spec() -> TransactionSpec {
        TransactionSpec {
            family_name: "smallbank".to_string(),
            family_version: "1.0".to_string(),
            inputs: vec!["332514aa".to_string()],
            outputs: vec!["332514aa".to_string()],
            payload: b"test payload".to_vec(),
        }
    }

    #[test]
    fn test_create_and_validate() {
        let signer = KeyPair::generate();
        let batcher = KeyPair::generate();
        let txn = Transaction::create(test_spec(), &signer, &batcher.public_key_hex()).unwrap();

        assert_eq!(txn.id().len(), SIGNATURE_HEX_LEN);
        assert_eq!(txn.header.signer_public_key, signer.public_key_hex());
        assert_eq!(txn.header.batcher_public_key, batcher.public_key_hex());
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signer = KeyPair::generate();
        let mut txn =
            Transaction::create(test_spec(), &signer, &signer.public_key_hex()).unwrap();
        txn.payload = b"different payload".to_vec();

        let err = txn.validate().unwrap_err();
        assert!(err.to_string().contains("Payload digest mismatch"));
    }

    #[test]
    fn test_tampered_header_rejected() {
        let signer = KeyPair::generate();
        let mut txn =
            Transaction::create(test_spec(), &signer, &signer.public_key_hex()).unwrap();
        txn.header.family_name = "intkey".to_string();

        assert!(txn.validate().is_err());
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let signer = KeyPair::generate();
        let mut spec = test_spec();
        spec.payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];

        let err = Transaction::create(spec, &signer, &signer.public_key_hex()).unwrap_err();
        assert!(err.to_string().contains("Payload too large"));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abcdef0123456789"), "abcdef01...");
        assert_eq!(short_id("abc"), "abc");
    }
}
