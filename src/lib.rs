//! cognito-backup - encrypted backups of a user directory pool
//!
//! This library lists the users and groups of a directory pool, encrypts
//! each listing through a key service and stores the ciphertext in an
//! object store bucket. An optional rotation sweep deletes old objects
//! from the bucket afterwards.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration resolution from environment and event
//! - `error`: Custom error types
//! - `directory`: Directory service seam and pool models
//! - `crypto`: Key service seam and the local key ring
//! - `storage`: Object store seam and the filesystem bucket store
//! - `backup`: Backup orchestration and retention sweep
//! - `cloud`: Service client construction
//! - `handler`: Invocation entry point
//! - `logging`: Subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use cognito_backup::cloud::LocalCloud;
//! use cognito_backup::config::{CloudPaths, Environment};
//! use cognito_backup::handler::Handler;
//!
//! let env = Environment::from_process();
//! let cloud = LocalCloud::new(CloudPaths::resolve(None, &env)?);
//! let handler = Handler::new(env, cloud, tracing::info_span!("invocation"));
//! let response = handler.handle(None)?;
//! ```

pub mod backup;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod handler;
pub mod logging;
pub mod storage;

pub use error::{BackupError, BackupResult, ServiceError};
