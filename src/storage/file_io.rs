//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't leave half-written objects behind.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{BackupError, BackupResult};

/// Read JSON from a file, returning an error if file doesn't exist
pub fn read_json_required<T, P>(path: P) -> BackupResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Err(BackupError::Io(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)
        .map_err(|e| BackupError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| BackupError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> BackupResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let bytes = serde_json::to_vec_pretty(data)
        .map_err(|e| BackupError::Json(format!("Failed to serialize data: {}", e)))?;
    write_bytes_atomic(path, &bytes)
}

/// Write raw bytes to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all.
pub fn write_bytes_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> BackupResult<()> {
    let path = path.as_ref();
    create_parent(path)?;

    // Temp file must live in the same directory for the rename to be atomic
    let temp_path = temp_path_for(path);
    write_then_rename(&temp_path, path, data)
}

/// Write raw bytes atomically, staging the temp file in `staging_dir`
///
/// `staging_dir` must be on the same filesystem as `path`. Nothing is ever
/// written next to `path` except the final file.
pub fn write_bytes_staged<P, Q>(path: P, data: &[u8], staging_dir: Q) -> BackupResult<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path = path.as_ref();
    let staging_dir = staging_dir.as_ref();
    create_parent(path)?;
    fs::create_dir_all(staging_dir).map_err(|e| {
        BackupError::Io(format!(
            "Failed to create directory {}: {}",
            staging_dir.display(),
            e
        ))
    })?;

    let sequence = STAGING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let temp_path = staging_dir.join(format!("{}-{}.tmp", std::process::id(), sequence));
    write_then_rename(&temp_path, path, data)
}

static STAGING_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn create_parent(path: &Path) -> BackupResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BackupError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

fn write_then_rename(temp_path: &Path, path: &Path, data: &[u8]) -> BackupResult<()> {
    let file = File::create(temp_path)
        .map_err(|e| BackupError::Io(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(data)
        .map_err(|e| BackupError::Io(format!("Failed to write data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| BackupError::Io(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| BackupError::Io(format!("Failed to sync data: {}", e)))?;

    fs::rename(temp_path, path).map_err(|e| {
        let _ = fs::remove_file(temp_path);
        BackupError::Io(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_json_atomic(&path, &data).unwrap();
        let loaded: TestData = read_json_required(&path).unwrap();
        assert_eq!(data, loaded);
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.json");

        write_bytes_atomic(&path, b"ciphertext").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"ciphertext");
        assert!(!temp_dir.path().join("users.json.tmp").exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir
            .path()
            .join("platform")
            .join("2024-01-01T00:00:00Z")
            .join("groups.json");

        write_bytes_atomic(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_staged_write_leaves_target_directory_clean() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("objects").join("users.json");
        let staging = temp_dir.path().join("staging");

        write_bytes_staged(&path, b"first", &staging).unwrap();
        write_bytes_staged(&path, b"second", &staging).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let entries: Vec<_> = fs::read_dir(temp_dir.path().join("objects"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("users.json")]);
        assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_read_json_required() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");

        assert!(matches!(
            read_json_required::<TestData, _>(&path),
            Err(BackupError::Io(_))
        ));

        fs::write(&path, "not json at all").unwrap();
        assert!(matches!(
            read_json_required::<TestData, _>(&path),
            Err(BackupError::Json(_))
        ));
    }
}
