//! Service clients for one invocation
//!
//! A `CloudConnector` turns a resolved configuration into the three service
//! clients, each bound to its configured region.

use crate::config::{BackupConfig, CloudPaths};
use crate::crypto::{KeyService, LocalKeyRing};
use crate::directory::{DirectoryService, LocalDirectory};
use crate::error::{BackupError, BackupResult};
use crate::storage::{FsObjectStore, ObjectStore};

/// The clients an invocation talks to
pub struct CloudClients {
    pub directory: Box<dyn DirectoryService>,
    pub keys: Box<dyn KeyService>,
    pub store: Box<dyn ObjectStore>,
}

/// Creates service clients for a configuration
pub trait CloudConnector {
    fn connect(&self, config: &BackupConfig) -> BackupResult<CloudClients>;
}

/// Connects to the filesystem-backed services under one root
#[derive(Debug, Clone)]
pub struct LocalCloud {
    paths: CloudPaths,
}

impl LocalCloud {
    pub fn new(paths: CloudPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &CloudPaths {
        &self.paths
    }

    pub fn directory(&self, region: &str) -> LocalDirectory {
        LocalDirectory::new(self.paths.directory_dir(region))
    }

    pub fn keyring(&self, region: &str) -> LocalKeyRing {
        LocalKeyRing::new(self.paths.keyring_dir(region))
    }

    pub fn store(&self, region: &str) -> FsObjectStore {
        FsObjectStore::new(self.paths.bucket_root(region))
    }
}

impl CloudConnector for LocalCloud {
    fn connect(&self, config: &BackupConfig) -> BackupResult<CloudClients> {
        if !self.paths.root().is_dir() {
            return Err(BackupError::Connect(format!(
                "local cloud root {} does not exist",
                self.paths.root().display()
            )));
        }

        Ok(CloudClients {
            directory: Box::new(self.directory(&config.user_pool_region)),
            keys: Box::new(self.keyring(&config.key_region)),
            store: Box::new(self.store(&config.bucket_region)),
        })
    }
}
