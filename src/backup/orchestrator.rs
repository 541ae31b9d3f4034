//! Backup orchestrator
//!
//! Runs fetch, serialize, encrypt and store for users and then groups. Every
//! step is fatal: a failure for users means groups is never attempted, and
//! objects already written are left in place.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, error, info, Span};

use crate::config::BackupConfig;
use crate::crypto::KeyService;
use crate::directory::{DirectoryService, ResourceKind};
use crate::error::{BackupError, BackupResult};
use crate::storage::{ObjectAcl, ObjectStore, PutObjectRequest, ServerSideEncryption};

/// Value of the `producer` tag on every backup object
pub const PRODUCER_TAG: &str = "cognito-backup";

/// Content disposition of every backup object
pub const CONTENT_DISPOSITION: &str = "attachment";

/// Build an object key: `[prefix/]timestamp/name`
pub fn key_name(prefix: &str, timestamp: &str, name: &str) -> String {
    if prefix.is_empty() {
        format!("{}/{}", timestamp, name)
    } else {
        format!("{}/{}/{}", prefix, timestamp, name)
    }
}

/// Folder name shared by all objects of one backup (RFC3339, whole seconds)
pub fn backup_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Outcome of a successful backup run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    /// Timestamp folder the objects were written under
    pub timestamp: String,
    /// Keys written, in backup order
    pub objects: Vec<String>,
}

/// Copies the directory pool into the bucket
pub struct BackupOrchestrator<'a> {
    directory: &'a dyn DirectoryService,
    keys: &'a dyn KeyService,
    store: &'a dyn ObjectStore,
    span: Span,
}

impl<'a> BackupOrchestrator<'a> {
    /// Create an orchestrator logging into `span`
    pub fn new(
        directory: &'a dyn DirectoryService,
        keys: &'a dyn KeyService,
        store: &'a dyn ObjectStore,
        span: Span,
    ) -> Self {
        Self {
            directory,
            keys,
            store,
            span,
        }
    }

    /// Back up every resource kind under `timestamp`
    pub fn run(&self, config: &BackupConfig, timestamp: &str) -> BackupResult<BackupReport> {
        self.span.in_scope(|| {
            let mut objects = Vec::with_capacity(ResourceKind::ALL.len());
            for kind in ResourceKind::ALL {
                objects.push(self.backup(kind, config, timestamp)?);
            }

            info!(
                timestamp,
                bucket = %config.bucket_name,
                "Backup of pool {} completed", config.user_pool_id
            );
            Ok(BackupReport {
                timestamp: timestamp.to_string(),
                objects,
            })
        })
    }

    /// Back up one resource kind, returning the key written
    fn backup(
        &self,
        kind: ResourceKind,
        config: &BackupConfig,
        timestamp: &str,
    ) -> BackupResult<String> {
        info!(%kind, pool = %config.user_pool_id, "Fetching cognito {}", kind);
        let payload = self.snapshot(kind, &config.user_pool_id)?;
        debug!(%kind, bytes = payload.len(), "Serialized cognito {}", kind);

        let ciphertext = self.keys.encrypt(&config.key_id, &payload).map_err(|source| {
            let code = source.code.clone();
            error!(%kind, code = ?code, "Key service rejected the {} payload: {}", kind, source);
            BackupError::Encryption { kind, code, source }
        })?;

        let key = key_name(&config.backup_prefix, timestamp, kind.file_name());
        let request = PutObjectRequest {
            key: key.clone(),
            body: ciphertext,
            acl: ObjectAcl::Private,
            server_side_encryption: ServerSideEncryption::Aes256,
            content_disposition: CONTENT_DISPOSITION.to_string(),
            tagging: format!("producer={}", PRODUCER_TAG),
        };
        self.store
            .put_object(&config.bucket_name, request)
            .map_err(|source| BackupError::Upload {
                kind,
                key: key.clone(),
                source,
            })?;

        info!(%kind, key = %key, "Uploaded cognito {} backup", kind);
        Ok(key)
    }

    /// Fetch and serialize the full listing of one kind
    fn snapshot(&self, kind: ResourceKind, pool_id: &str) -> BackupResult<Vec<u8>> {
        let serialized = match kind {
            ResourceKind::Users => {
                let listing = self
                    .directory
                    .list_users(pool_id)
                    .map_err(|source| BackupError::Directory { kind, source })?;
                serde_json::to_vec(&listing)
            }
            ResourceKind::Groups => {
                let listing = self
                    .directory
                    .list_groups(pool_id)
                    .map_err(|source| BackupError::Directory { kind, source })?;
                serde_json::to_vec(&listing)
            }
        };
        serialized.map_err(|source| BackupError::Serialize { kind, source })
    }
}
