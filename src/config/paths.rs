//! Path management for the local service backends
//!
//! The local directory, key ring and object store all live under one root,
//! partitioned by service and region:
//!
//! ```text
//! <root>/cognito/<region>/<pool_id>.json
//! <root>/kms/<region>/<key_id>.key
//! <root>/s3/<region>/<bucket>/
//! ```
//!
//! ## Root Resolution Order
//!
//! 1. An explicit root (the `--cloud-root` flag or `LOCAL_CLOUD_ROOT`)
//! 2. `$XDG_DATA_HOME/cognito-backup`
//! 3. `$HOME/.local/share/cognito-backup`

use std::path::{Path, PathBuf};

use super::environment::Environment;
use crate::error::{BackupError, BackupResult};

const APP_DIR: &str = "cognito-backup";

/// Manages all paths used by the local backends
#[derive(Debug, Clone)]
pub struct CloudPaths {
    root: PathBuf,
}

impl CloudPaths {
    /// Resolve the root from an explicit override or the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and neither `XDG_DATA_HOME`
    /// nor `HOME` is set.
    pub fn resolve(explicit: Option<PathBuf>, env: &Environment) -> BackupResult<Self> {
        if let Some(root) = explicit {
            return Ok(Self { root });
        }

        let xdg = env.get("XDG_DATA_HOME");
        if !xdg.is_empty() {
            return Ok(Self {
                root: PathBuf::from(xdg).join(APP_DIR),
            });
        }

        let home = env.get("HOME");
        if home.is_empty() {
            return Err(BackupError::Config(
                "Could not determine the local cloud root; set LOCAL_CLOUD_ROOT".into(),
            ));
        }
        Ok(Self {
            root: PathBuf::from(home).join(".local").join("share").join(APP_DIR),
        })
    }

    /// Create CloudPaths with a custom root (useful for testing)
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding pool exports for a region
    pub fn directory_dir(&self, region: &str) -> PathBuf {
        self.root.join("cognito").join(region)
    }

    /// Directory holding keys for a region
    pub fn keyring_dir(&self, region: &str) -> PathBuf {
        self.root.join("kms").join(region)
    }

    /// Directory holding buckets for a region
    pub fn bucket_root(&self, region: &str) -> PathBuf {
        self.root.join("s3").join(region)
    }
}
