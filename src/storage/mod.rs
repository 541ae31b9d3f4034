//! Object storage for backup payloads
//!
//! `ObjectStore` is the seam to the bucket service. Backups are written as
//! private, server-side-encrypted objects; the retention sweep lists and
//! deletes them. `FsObjectStore` keeps buckets on the local filesystem.

pub mod file_io;
mod local;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub use local::{FsObjectStore, ObjectMetadata};

/// Canned access control applied to a stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectAcl {
    Private,
    PublicRead,
}

/// Server-side encryption applied by the storage service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerSideEncryption {
    #[serde(rename = "AES256")]
    Aes256,
    #[serde(rename = "aws:kms")]
    Kms,
}

impl fmt::Display for ServerSideEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes256 => write!(f, "AES256"),
            Self::Kms => write!(f, "aws:kms"),
        }
    }
}

/// A request to store one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    pub key: String,
    pub body: Vec<u8>,
    pub acl: ObjectAcl,
    pub server_side_encryption: ServerSideEncryption,
    pub content_disposition: String,
    /// URL-encoded tag set, e.g. `producer=cognito-backup`
    pub tagging: String,
}

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

impl ObjectSummary {
    /// Age in whole days at `now`, truncated toward zero
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.last_modified).num_days()
    }
}

/// Access to a bucket-oriented object store
#[cfg_attr(test, mockall::automock)]
pub trait ObjectStore {
    /// Store an object, replacing any object with the same key
    fn put_object(&self, bucket: &str, request: PutObjectRequest) -> Result<(), ServiceError>;

    /// List every object in the bucket
    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, ServiceError>;

    /// Delete one object
    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_age_days_truncates() {
        let now = Utc::now();
        let summary = ObjectSummary {
            key: "a".into(),
            last_modified: now - Duration::hours(24 * 7 - 1),
            size: 0,
        };
        assert_eq!(summary.age_days(now), 6);

        let summary = ObjectSummary {
            last_modified: now - Duration::hours(24 * 7),
            ..summary
        };
        assert_eq!(summary.age_days(now), 7);
    }

    #[test]
    fn test_sse_wire_names() {
        assert_eq!(ServerSideEncryption::Aes256.to_string(), "AES256");
        assert_eq!(
            serde_json::to_string(&ServerSideEncryption::Aes256).unwrap(),
            "\"AES256\""
        );
    }
}
