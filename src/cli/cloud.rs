//! Local cloud CLI commands
//!
//! Prepares the filesystem-backed services: keys, buckets and pool
//! exports. `decrypt` reads a backup object back into plain JSON.

use std::path::PathBuf;

use clap::Subcommand;

use crate::cloud::LocalCloud;
use crate::directory::PoolExport;
use crate::error::{BackupError, BackupResult, ServiceError};
use crate::storage::file_io::{read_json_required, write_bytes_atomic, write_json_atomic};

/// Local cloud subcommands
#[derive(Subcommand)]
pub enum CloudCommands {
    /// Create the local cloud root
    Init,

    /// Create a new encryption key
    CreateKey {
        /// Key id, e.g. `alias/backup`
        key_id: String,
        /// Key service region
        #[arg(long, env = "KMS_REGION")]
        region: String,
    },

    /// Disable an encryption key
    DisableKey {
        key_id: String,
        #[arg(long, env = "KMS_REGION")]
        region: String,
    },

    /// Create a bucket
    CreateBucket {
        bucket: String,
        /// Object store region
        #[arg(long, env = "S3_BUCKET_REGION")]
        region: String,
    },

    /// Import a pool export file as a user pool
    ImportPool {
        /// User pool id
        pool_id: String,
        /// JSON file with `users` and `groups` arrays
        file: PathBuf,
        /// Directory service region
        #[arg(long, env = "COGNITO_REGION")]
        region: String,
    },

    /// Decrypt a backup object
    Decrypt {
        bucket: String,
        /// Object key, e.g. `daily/2024-05-01T10:00:00Z/users.json`
        key: String,
        #[arg(long, env = "S3_BUCKET_REGION")]
        region: String,
        #[arg(long, env = "KMS_REGION")]
        key_region: String,
        /// Write the plaintext here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn service_failure(action: &str, e: ServiceError) -> BackupError {
    BackupError::Config(format!("Failed to {}: {}", action, e))
}

/// Handle a local cloud command
pub fn handle_cloud_command(cloud: &LocalCloud, cmd: CloudCommands) -> BackupResult<()> {
    match cmd {
        CloudCommands::Init => {
            std::fs::create_dir_all(cloud.paths().root()).map_err(|e| {
                BackupError::Io(format!(
                    "Failed to create {}: {}",
                    cloud.paths().root().display(),
                    e
                ))
            })?;
            println!("Local cloud root: {}", cloud.paths().root().display());
        }

        CloudCommands::CreateKey { key_id, region } => {
            let path = cloud
                .keyring(&region)
                .create_key(&key_id)
                .map_err(|e| service_failure("create key", e))?;
            println!("Created key '{}' in {}", key_id, region);
            println!("Key file: {}", path.display());
        }

        CloudCommands::DisableKey { key_id, region } => {
            cloud
                .keyring(&region)
                .disable_key(&key_id)
                .map_err(|e| service_failure("disable key", e))?;
            println!("Disabled key '{}' in {}", key_id, region);
        }

        CloudCommands::CreateBucket { bucket, region } => {
            cloud
                .store(&region)
                .create_bucket(&bucket)
                .map_err(|e| service_failure("create bucket", e))?;
            println!("Created bucket '{}' in {}", bucket, region);
        }

        CloudCommands::ImportPool {
            pool_id,
            file,
            region,
        } => {
            let export: PoolExport = read_json_required(&file)?;
            let directory = cloud.directory(&region);
            let path = directory
                .export_path(&pool_id)
                .map_err(|e| service_failure("import pool", e))?;
            write_json_atomic(&path, &export)?;
            println!(
                "Imported {} user(s) and {} group(s) into pool {}",
                export.users.len(),
                export.groups.len(),
                pool_id
            );
        }

        CloudCommands::Decrypt {
            bucket,
            key,
            region,
            key_region,
            output,
        } => {
            let blob = cloud
                .store(&region)
                .get_object(&bucket, &key)
                .map_err(|e| service_failure("get object", e))?;
            let plaintext = cloud
                .keyring(&key_region)
                .decrypt(&blob)
                .map_err(|e| service_failure("decrypt object", e))?;

            match output {
                Some(path) => {
                    write_bytes_atomic(&path, &plaintext)?;
                    println!("Wrote {} bytes to {}", plaintext.len(), path.display());
                }
                None => println!("{}", String::from_utf8_lossy(&plaintext)),
            }
        }
    }

    Ok(())
}
