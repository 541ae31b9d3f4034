//! Filesystem object store
//!
//! Each bucket is a directory under the store root:
//!
//! ```text
//! <root>/<bucket>/objects/<key>            object body
//! <root>/<bucket>/metadata/<key>.meta.json ObjectMetadata sidecar
//! <root>/<bucket>/staging/                 in-flight uploads
//! ```
//!
//! Keys may contain `/`, which maps onto nested directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::file_io::{read_json_required, write_bytes_staged, write_json_atomic};
use super::{ObjectAcl, ObjectStore, ObjectSummary, PutObjectRequest, ServerSideEncryption};
use crate::error::ServiceError;

const SERVICE: &str = "s3";
const OBJECTS_DIR: &str = "objects";
const METADATA_DIR: &str = "metadata";
const STAGING_DIR: &str = "staging";
const METADATA_SUFFIX: &str = ".meta.json";

/// Stored attributes of an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub acl: ObjectAcl,
    pub server_side_encryption: ServerSideEncryption,
    pub content_disposition: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

/// Object store keeping buckets as directories
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store whose buckets live under `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory holding the buckets
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a bucket; succeeds if it already exists
    pub fn create_bucket(&self, bucket: &str) -> Result<(), ServiceError> {
        validate_bucket_name(bucket)?;
        let dir = self.root.join(bucket);
        for sub in [OBJECTS_DIR, METADATA_DIR] {
            fs::create_dir_all(dir.join(sub)).map_err(|e| {
                ServiceError::new(SERVICE, format!("Failed to create bucket {}: {}", bucket, e))
            })?;
        }
        Ok(())
    }

    /// Read the metadata sidecar of an object
    pub fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, ServiceError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        check_key(key)?;
        let path = metadata_path(&bucket_dir, key);
        if !path.exists() {
            return Err(no_such_key(key));
        }
        read_json_required(&path).map_err(|e| ServiceError::new(SERVICE, e.to_string()))
    }

    /// Read an object body
    pub fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ServiceError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        check_key(key)?;
        let path = object_path(&bucket_dir, key);
        if !path.exists() {
            return Err(no_such_key(key));
        }
        fs::read(&path).map_err(|e| {
            ServiceError::new(SERVICE, format!("Failed to read object {}: {}", key, e))
        })
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, ServiceError> {
        let dir = self.root.join(bucket);
        if bucket.is_empty() || !dir.join(OBJECTS_DIR).is_dir() {
            return Err(ServiceError::new(
                SERVICE,
                format!("The specified bucket does not exist: {}", bucket),
            )
            .with_code("NoSuchBucket"));
        }
        Ok(dir)
    }

    fn summarize(
        &self,
        bucket_dir: &Path,
        key: String,
        path: &Path,
    ) -> Result<ObjectSummary, ServiceError> {
        let sidecar = metadata_path(bucket_dir, &key);
        if sidecar.exists() {
            let meta: ObjectMetadata = read_json_required(&sidecar)
                .map_err(|e| ServiceError::new(SERVICE, e.to_string()))?;
            return Ok(ObjectSummary {
                key,
                last_modified: meta.last_modified,
                size: meta.size,
            });
        }

        // Objects placed into the bucket by other means carry no sidecar
        let fs_meta = fs::metadata(path)
            .map_err(|e| ServiceError::new(SERVICE, format!("Failed to stat {}: {}", key, e)))?;
        let modified = fs_meta
            .modified()
            .map_err(|e| ServiceError::new(SERVICE, format!("Failed to stat {}: {}", key, e)))?;
        Ok(ObjectSummary {
            key,
            last_modified: DateTime::<Utc>::from(modified),
            size: fs_meta.len(),
        })
    }
}

impl ObjectStore for FsObjectStore {
    fn put_object(&self, bucket: &str, request: PutObjectRequest) -> Result<(), ServiceError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        check_key(&request.key)?;

        let metadata = ObjectMetadata {
            acl: request.acl,
            server_side_encryption: request.server_side_encryption,
            content_disposition: request.content_disposition,
            tags: parse_tagging(&request.tagging),
            last_modified: Utc::now(),
            size: request.body.len() as u64,
        };

        let staging_dir = bucket_dir.join(STAGING_DIR);
        write_bytes_staged(object_path(&bucket_dir, &request.key), &request.body, staging_dir)
            .map_err(|e| ServiceError::new(SERVICE, e.to_string()))?;
        write_json_atomic(metadata_path(&bucket_dir, &request.key), &metadata)
            .map_err(|e| ServiceError::new(SERVICE, e.to_string()))?;

        Ok(())
    }

    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, ServiceError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let objects_dir = bucket_dir.join(OBJECTS_DIR);

        let mut files = Vec::new();
        collect_files(&objects_dir, &mut files)
            .map_err(|e| ServiceError::new(SERVICE, format!("Failed to list {}: {}", bucket, e)))?;

        let mut summaries = Vec::with_capacity(files.len());
        for path in files {
            let Some(key) = key_for(&objects_dir, &path) else {
                continue;
            };
            summaries.push(self.summarize(&bucket_dir, key, &path)?);
        }

        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(summaries)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ServiceError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        check_key(key)?;

        // Deleting a key that does not exist is not an error
        for path in [object_path(&bucket_dir, key), metadata_path(&bucket_dir, key)] {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    ServiceError::new(SERVICE, format!("Failed to delete {}: {}", key, e))
                        .with_code("AccessDenied")
                })?;
            }
        }
        Ok(())
    }
}

fn object_path(bucket_dir: &Path, key: &str) -> PathBuf {
    bucket_dir.join(OBJECTS_DIR).join(key)
}

fn metadata_path(bucket_dir: &Path, key: &str) -> PathBuf {
    bucket_dir
        .join(METADATA_DIR)
        .join(format!("{}{}", key, METADATA_SUFFIX))
}

fn no_such_key(key: &str) -> ServiceError {
    ServiceError::new(SERVICE, format!("The specified key does not exist: {}", key))
        .with_code("NoSuchKey")
}

fn validate_bucket_name(bucket: &str) -> Result<(), ServiceError> {
    let valid = (3..=63).contains(&bucket.len())
        && bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ServiceError::new(SERVICE, format!("Invalid bucket name: {}", bucket))
            .with_code("InvalidBucketName"))
    }
}

/// Keys must stay inside the bucket directory
fn check_key(key: &str) -> Result<(), ServiceError> {
    let path = Path::new(key);
    let escapes = key.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(
            ServiceError::new(SERVICE, format!("Invalid object key: {}", key))
                .with_code("InvalidArgument"),
        );
    }
    Ok(())
}

fn key_for(objects_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(objects_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Parse a `k1=v1&k2=v2` tag set
fn parse_tagging(tagging: &str) -> BTreeMap<String, String> {
    tagging
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
