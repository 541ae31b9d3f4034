//! Key service access
//!
//! Backup payloads are encrypted by a key service before they are stored;
//! this crate never handles the service's master keys itself. `KeyService`
//! is the seam; `LocalKeyRing` is an AES-256-GCM key ring kept on disk.

pub mod encryption;
mod keyring;

use crate::error::ServiceError;

pub use encryption::{decrypt, encrypt, DataKey, EncryptedData};
pub use keyring::LocalKeyRing;

/// Service name used in key service errors
pub(crate) const SERVICE: &str = "kms";

/// Encrypts payloads under a named key
#[cfg_attr(test, mockall::automock)]
pub trait KeyService {
    /// Encrypt `plaintext` with the key identified by `key_id`, returning
    /// the ciphertext blob
    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, ServiceError>;
}
