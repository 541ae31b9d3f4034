//! Retention sweeper
//!
//! Deletes bucket objects whose age in whole days reaches the configured
//! threshold. The sweep covers the entire bucket, not just the backup
//! prefix. Listing failure aborts the sweep; a failed delete is logged and
//! the sweep moves on.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn, Span};

use crate::error::{BackupError, BackupResult, ServiceError};
use crate::storage::ObjectStore;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
    /// Objects that were due for deletion but could not be deleted
    pub failed: Vec<(String, ServiceError)>,
}

/// Applies the age-based rotation policy to a bucket
pub struct RetentionSweeper<'a> {
    store: &'a dyn ObjectStore,
    span: Span,
}

impl<'a> RetentionSweeper<'a> {
    /// Create a sweeper logging into `span`
    pub fn new(store: &'a dyn ObjectStore, span: Span) -> Self {
        Self { store, span }
    }

    /// Delete every object in `bucket` at least `days_limit` days old at `now`
    pub fn sweep(
        &self,
        bucket: &str,
        days_limit: u64,
        now: DateTime<Utc>,
    ) -> BackupResult<SweepReport> {
        self.span.in_scope(|| {
            let objects = self
                .store
                .list_objects(bucket)
                .map_err(|source| BackupError::Rotation { source })?;

            let limit = i64::try_from(days_limit).unwrap_or(i64::MAX);
            let mut report = SweepReport::default();

            for object in objects {
                let age = object.age_days(now);
                if age < limit {
                    debug!(
                        key = %object.key,
                        age,
                        "Object is younger than the rotation limit of {} days, skipping", days_limit
                    );
                    report.retained.push(object.key);
                    continue;
                }

                info!(
                    key = %object.key,
                    age,
                    "Object reached the rotation limit of {} days, deleting", days_limit
                );
                match self.store.delete_object(bucket, &object.key) {
                    Ok(()) => {
                        debug!(key = %object.key, bucket, "Object deleted");
                        report.deleted.push(object.key);
                    }
                    Err(e) => {
                        warn!(key = %object.key, bucket, "Failed to delete object: {}", e);
                        report.failed.push((object.key, e));
                    }
                }
            }

            info!(
                deleted = report.deleted.len(),
                retained = report.retained.len(),
                failed = report.failed.len(),
                "Rotation of bucket {} finished", bucket
            );
            Ok(report)
        })
    }
}
