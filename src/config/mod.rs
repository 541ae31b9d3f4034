//! Configuration module for cognito-backup
//!
//! This module provides:
//! - the invocation event and response records
//! - an environment snapshot
//! - resolution of the per-invocation backup configuration
//! - path resolution for the local service backends

pub mod environment;
pub mod event;
pub mod paths;
pub mod resolver;

pub use environment::Environment;
pub use event::{InvocationEvent, Response};
pub use paths::CloudPaths;
pub use resolver::{env_vars, BackupConfig, ConfigResolver, Retention};
