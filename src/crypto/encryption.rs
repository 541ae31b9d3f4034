//! AES-256-GCM encryption/decryption
//!
//! Provides authenticated encryption for backup payloads using AES-256-GCM.
//! Each encryption operation generates a unique nonce, and the key id is
//! bound to the ciphertext as associated data.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ServiceError;

use super::SERVICE;

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Current envelope format version
const VERSION: u8 = 1;

/// A 256-bit data key, wiped from memory on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DataKey {
    key: [u8; KEY_SIZE],
}

impl DataKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Build a key from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ServiceError> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            ServiceError::new(
                SERVICE,
                format!("Invalid key size: expected {}, got {}", KEY_SIZE, bytes.len()),
            )
            .with_code("KMSInvalidStateException")
        })?;
        Ok(Self { key })
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

/// Encrypted data with associated metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    /// Version for future algorithm upgrades
    pub version: u8,
    /// Id of the key that produced this ciphertext
    pub key_id: String,
    /// The nonce used for this encryption (base64 encoded)
    pub nonce: String,
    /// The encrypted ciphertext with authentication tag (base64 encoded)
    pub ciphertext: String,
}

impl EncryptedData {
    /// Serialize into the opaque blob handed back to callers
    pub fn to_blob(&self) -> Result<Vec<u8>, ServiceError> {
        serde_json::to_vec(self).map_err(|e| {
            ServiceError::new(SERVICE, format!("Failed to encode ciphertext: {}", e))
        })
    }

    /// Parse a blob produced by [`EncryptedData::to_blob`]
    pub fn from_blob(blob: &[u8]) -> Result<Self, ServiceError> {
        serde_json::from_slice(blob)
            .map_err(|e| invalid_ciphertext(format!("Malformed blob: {}", e)))
    }

    fn decode_nonce(&self) -> Result<Vec<u8>, ServiceError> {
        STANDARD
            .decode(&self.nonce)
            .map_err(|e| invalid_ciphertext(format!("Invalid nonce encoding: {}", e)))
    }

    fn decode_ciphertext(&self) -> Result<Vec<u8>, ServiceError> {
        STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| invalid_ciphertext(format!("Invalid ciphertext encoding: {}", e)))
    }
}

fn invalid_ciphertext(message: String) -> ServiceError {
    ServiceError::new(SERVICE, message).with_code("InvalidCiphertextException")
}

/// Encrypt plaintext data using AES-256-GCM
pub fn encrypt(
    plaintext: &[u8],
    key_id: &str,
    key: &DataKey,
) -> Result<EncryptedData, ServiceError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ServiceError::new(SERVICE, format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: key_id.as_bytes(),
            },
        )
        .map_err(|e| ServiceError::new(SERVICE, format!("Encryption failed: {}", e)))?;

    Ok(EncryptedData {
        version: VERSION,
        key_id: key_id.to_string(),
        nonce: STANDARD.encode(nonce_bytes),
        ciphertext: STANDARD.encode(ciphertext),
    })
}

/// Decrypt ciphertext using AES-256-GCM
pub fn decrypt(encrypted: &EncryptedData, key: &DataKey) -> Result<Vec<u8>, ServiceError> {
    if encrypted.version != VERSION {
        return Err(invalid_ciphertext(format!(
            "Unsupported encryption version: {}",
            encrypted.version
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ServiceError::new(SERVICE, format!("Failed to create cipher: {}", e)))?;

    let nonce_bytes = encrypted.decode_nonce()?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(invalid_ciphertext(format!(
            "Invalid nonce size: expected {}, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        )));
    }
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = encrypted.decode_ciphertext()?;

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext.as_ref(),
                aad: encrypted.key_id.as_bytes(),
            },
        )
        .map_err(|_| {
            invalid_ciphertext("Decryption failed: invalid key or corrupted data".to_string())
        })
}
