//! Key ring stored on the local filesystem
//!
//! Each key is a JSON file `<key_id>.key` holding base64 key material.
//! Key ids may use the `alias/<name>` form, which maps to a subdirectory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::encryption::{self, DataKey, EncryptedData};
use super::{KeyService, SERVICE};
use crate::error::ServiceError;
use crate::storage::file_io::{read_json_required, write_json_atomic};

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct KeyFile {
    key_id: String,
    #[zeroize(skip)]
    created_at: DateTime<Utc>,
    enabled: bool,
    /// Base64 key material
    material: String,
}

/// AES-256-GCM key ring rooted at one directory
#[derive(Debug, Clone)]
pub struct LocalKeyRing {
    dir: PathBuf,
}

impl LocalKeyRing {
    /// Create a key ring reading keys from `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Path of the key file for `key_id`
    pub fn key_path(&self, key_id: &str) -> PathBuf {
        self.dir.join(format!("{}.key", key_id))
    }

    /// Create a new random key
    ///
    /// Fails with `AlreadyExistsException` if the key id is taken.
    pub fn create_key(&self, key_id: &str) -> Result<PathBuf, ServiceError> {
        check_key_id(key_id)?;
        let path = self.key_path(key_id);
        if path.exists() {
            return Err(ServiceError::new(
                SERVICE,
                format!("Key '{}' already exists", key_id),
            )
            .with_code("AlreadyExistsException"));
        }

        let key = DataKey::generate();
        let file = KeyFile {
            key_id: key_id.to_string(),
            created_at: Utc::now(),
            enabled: true,
            material: STANDARD.encode(key.as_bytes()),
        };
        write_json_atomic(&path, &file).map_err(|e| ServiceError::new(SERVICE, e.to_string()))?;

        Ok(path)
    }

    /// Mark a key as disabled; encryption under it is refused afterwards
    pub fn disable_key(&self, key_id: &str) -> Result<(), ServiceError> {
        let mut file = self.read_key_file(key_id)?;
        file.enabled = false;
        write_json_atomic(self.key_path(key_id), &file)
            .map_err(|e| ServiceError::new(SERVICE, e.to_string()))
    }

    /// Decrypt a blob produced by this key ring
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let encrypted = EncryptedData::from_blob(blob)?;
        let key = self.load_key(&encrypted.key_id)?;
        encryption::decrypt(&encrypted, &key)
    }

    fn read_key_file(&self, key_id: &str) -> Result<KeyFile, ServiceError> {
        check_key_id(key_id)?;
        let path = self.key_path(key_id);
        if !path.exists() {
            return Err(
                ServiceError::new(SERVICE, format!("Key '{}' does not exist", key_id))
                    .with_code("NotFoundException"),
            );
        }
        read_json_required(&path).map_err(|e| ServiceError::new(SERVICE, e.to_string()))
    }

    fn load_key(&self, key_id: &str) -> Result<DataKey, ServiceError> {
        let file = self.read_key_file(key_id)?;
        if !file.enabled {
            return Err(
                ServiceError::new(SERVICE, format!("Key '{}' is disabled", key_id))
                    .with_code("DisabledException"),
            );
        }

        let material = Zeroizing::new(STANDARD.decode(&file.material).map_err(|e| {
            ServiceError::new(SERVICE, format!("Corrupt key material for '{}': {}", key_id, e))
                .with_code("KMSInvalidStateException")
        })?);
        DataKey::from_slice(&material)
    }
}

impl KeyService for LocalKeyRing {
    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let key = self.load_key(key_id)?;
        encryption::encrypt(plaintext, key_id, &key)?.to_blob()
    }
}

fn check_key_id(key_id: &str) -> Result<(), ServiceError> {
    let invalid = key_id.is_empty()
        || Path::new(key_id)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if invalid {
        return Err(
            ServiceError::new(SERVICE, format!("Invalid key id: {}", key_id))
                .with_code("InvalidKeyUsageException"),
        );
    }
    Ok(())
}
