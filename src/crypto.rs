//! Cryptographic primitives for Palisade
//!
//! Every ledger structure (transaction, batch, block) is identified by the
//! hex encoding of the compact ECDSA signature over its header, so signatures
//! double as identifiers: 64 signature bytes become a 128-character hex id.

use crate::error::{ChainError, Result};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256, Sha512};

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Length of a hex-encoded compact signature, and therefore of every
/// transaction, batch, and block id.
pub const SIGNATURE_HEX_LEN: usize = COMPACT_SIGNATURE_SIZE * 2;

/// Length of a hex-encoded compressed public key.
pub const PUBLIC_KEY_HEX_LEN: usize = PUBLIC_KEY_SIZE * 2;

/// Hex encoding of the SHA-512 digest of `data`.
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}

/// Hex encoding of the SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Returns true if `s` is entirely lowercase hex of the expected length.
pub fn is_hex_id(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::KeyError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::KeyError(format!("Invalid secret key bytes: {}", e))
            }
        })?;
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        Ok(KeyPair {
            secret_key,
            public_key,
        })
    }

    /// Creates a KeyPair from a hex-encoded secret key.
    pub fn from_secret_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| ChainError::KeyError(format!("Invalid hex secret key: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    /// The signer identity used on the wire: the compressed public key as hex.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// The secret key as hex, for key files.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Signs a message (hashed with SHA-256 first) and returns the hex-encoded
    /// compact signature. The result is what ledger structures use as their id.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let digest = Sha256::digest(message);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))?;
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(hex::encode(signature.serialize_compact()))
    }
}

/// Verifies a hex-encoded compact signature against a hex-encoded compressed
/// public key and the raw message bytes.
pub fn verify_signature(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<()> {
    if public_key_hex.len() != PUBLIC_KEY_HEX_LEN {
        return Err(ChainError::CryptoError(format!(
            "Public key must be exactly {} hex characters (compressed), got {}",
            PUBLIC_KEY_HEX_LEN,
            public_key_hex.len()
        )));
    }
    if signature_hex.len() != SIGNATURE_HEX_LEN {
        return Err(ChainError::CryptoError(format!(
            "Signature must be exactly {} hex characters (compact), got {}",
            SIGNATURE_HEX_LEN,
            signature_hex.len()
        )));
    }

    let public_key_bytes = hex::decode(public_key_hex)
        .map_err(|e| ChainError::CryptoError(format!("Invalid public key hex: {}", e)))?;
    let public_key = PublicKey::from_slice(&public_key_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid public key: {}", e)))?;

    let signature_bytes = hex::decode(signature_hex)
        .map_err(|e| ChainError::CryptoError(format!("Invalid signature hex: {}", e)))?;
    let signature = Signature::from_compact(&signature_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid signature: {}", e)))?;

    let digest = Sha256::digest(message);
    let message = Message::from_digest_slice(&digest)
        .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| ChainError::CryptoError("Signature verification failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.public_key_hex().len(), PUBLIC_KEY_HEX_LEN);
        assert_eq!(keypair.secret_key_hex().len(), SECRET_KEY_SIZE * 2);
    }

    #[test]
    fn test_sign_produces_hex_id() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign(b"header bytes").unwrap();
        assert_eq!(signature.len(), SIGNATURE_HEX_LEN);
        assert!(is_hex_id(&signature, SIGNATURE_HEX_LEN));
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::generate();
        let message = b"Hello, Palisade!";

        let signature = keypair.sign(message).unwrap();
        let result = verify_signature(&keypair.public_key_hex(), message, &signature);
        assert!(result.is_ok());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let keypair1 = KeyPair::generate();
        let keypair2 = KeyPair::generate();

        let message = b"Test message";
        let signature = keypair1.sign(message).unwrap();

        let result = verify_signature(&keypair2.public_key_hex(), message, &signature);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Cryptographic error: Signature verification failed"
        );
    }

    #[test]
    fn test_tampered_message_rejected() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign(b"Original message").unwrap();

        let result = verify_signature(&keypair.public_key_hex(), b"Tampered message", &signature);
        assert!(result.is_err());
    }

    #[test]
    fn test_length_checks() {
        let keypair = KeyPair::generate();
        let message = b"Test";
        let signature = keypair.sign(message).unwrap();
        let pubkey_hex = keypair.public_key_hex();

        let result = verify_signature(&pubkey_hex[1..], message, &signature);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Public key must be exactly"));

        let result = verify_signature(&pubkey_hex, message, &signature[1..]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Signature must be exactly"));
    }

    #[test]
    fn test_secret_hex_round_trip() {
        let keypair = KeyPair::generate();
        let restored = KeyPair::from_secret_hex(&keypair.secret_key_hex()).unwrap();
        assert_eq!(restored.public_key_hex(), keypair.public_key_hex());
    }

    #[test]
    fn test_from_secret_bytes_invalid_length() {
        let short_bytes = [0u8; SECRET_KEY_SIZE - 1];
        let result = KeyPair::from_secret_bytes(&short_bytes);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Secret key must be"));
    }
}
