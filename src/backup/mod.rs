//! Backup system for cognito-backup
//!
//! # Architecture
//!
//! - `BackupOrchestrator`: copies users and groups into the bucket as
//!   encrypted objects
//! - `RetentionSweeper`: deletes bucket objects older than the rotation limit
//!
//! # Object Layout
//!
//! ```text
//! [<prefix>/]<RFC3339 timestamp>/users.json
//! [<prefix>/]<RFC3339 timestamp>/groups.json
//! ```
//!
//! Both objects of one backup share the timestamp folder. Bodies are key
//! service ciphertext, stored privately with AES-256 server-side encryption,
//! an `attachment` content disposition and a `producer=cognito-backup` tag.
//!
//! # Example
//!
//! ```rust,ignore
//! let orchestrator = BackupOrchestrator::new(&directory, &keys, &store, span.clone());
//! let report = orchestrator.run(&config, &backup_timestamp(now))?;
//!
//! if let Retention::Enabled { days } = config.retention {
//!     RetentionSweeper::new(&store, span).sweep(&config.bucket_name, days, now)?;
//! }
//! ```

mod orchestrator;
mod sweeper;

pub use orchestrator::{
    backup_timestamp, key_name, BackupOrchestrator, BackupReport, CONTENT_DISPOSITION,
    PRODUCER_TAG,
};
pub use sweeper::{RetentionSweeper, SweepReport};
