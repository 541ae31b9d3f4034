//! Directory service backed by pool export files
//!
//! Each pool is a JSON file named `<pool_id>.json` holding the pool's users
//! and groups:
//!
//! ```json
//! { "users": [{ "Username": "alice" }], "groups": [{ "GroupName": "admins" }] }
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::models::{GroupListing, GroupType, UserListing, UserType};
use super::DirectoryService;
use crate::error::ServiceError;
use crate::storage::file_io::read_json_required;

const SERVICE: &str = "cognito-idp";

/// Contents of a pool export file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolExport {
    #[serde(default)]
    pub users: Vec<UserType>,
    #[serde(default)]
    pub groups: Vec<GroupType>,
}

/// Serves directory listings from export files in one directory
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    export_dir: PathBuf,
}

impl LocalDirectory {
    /// Create a directory service reading exports from `export_dir`
    pub fn new(export_dir: PathBuf) -> Self {
        Self { export_dir }
    }

    /// Path of the export file for a pool
    ///
    /// Fails with `InvalidParameterException` if the pool id would leave the
    /// export directory.
    pub fn export_path(&self, pool_id: &str) -> Result<PathBuf, ServiceError> {
        check_pool_id(pool_id)?;
        Ok(self.export_dir.join(format!("{}.json", pool_id)))
    }

    fn load(&self, pool_id: &str) -> Result<PoolExport, ServiceError> {
        let path = self.export_path(pool_id)?;
        if !path.exists() {
            return Err(ServiceError::new(
                SERVICE,
                format!("User pool {} does not exist.", pool_id),
            )
            .with_code("ResourceNotFoundException"));
        }
        read_export(&path)
    }
}

fn check_pool_id(pool_id: &str) -> Result<(), ServiceError> {
    let mut components = Path::new(pool_id).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal {
        return Err(
            ServiceError::new(SERVICE, format!("Invalid user pool id: {}", pool_id))
                .with_code("InvalidParameterException"),
        );
    }
    Ok(())
}

fn read_export(path: &Path) -> Result<PoolExport, ServiceError> {
    read_json_required(path).map_err(|e| ServiceError::new(SERVICE, e.to_string()))
}

impl DirectoryService for LocalDirectory {
    fn list_users(&self, pool_id: &str) -> Result<UserListing, ServiceError> {
        let export = self.load(pool_id)?;
        Ok(UserListing {
            users: export.users,
            pagination_token: None,
        })
    }

    fn list_groups(&self, pool_id: &str) -> Result<GroupListing, ServiceError> {
        let export = self.load(pool_id)?;
        let groups = export
            .groups
            .into_iter()
            .map(|mut g| {
                g.user_pool_id.get_or_insert_with(|| pool_id.to_string());
                g
            })
            .collect();
        Ok(GroupListing {
            groups,
            next_token: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file_io::write_json_atomic;
    use tempfile::TempDir;

    fn create_test_directory() -> (LocalDirectory, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let directory = LocalDirectory::new(temp_dir.path().to_path_buf());

        let export = PoolExport {
            users: vec![UserType::new("alice"), UserType::new("bob")],
            groups: vec![GroupType::new("admins")],
        };
        let export_path = directory.export_path("eu-west-1_pool").unwrap();
        write_json_atomic(export_path, &export).unwrap();

        (directory, temp_dir)
    }

    #[test]
    fn test_list_users() {
        let (directory, _temp) = create_test_directory();

        let listing = directory.list_users("eu-west-1_pool").unwrap();
        let names: Vec<_> = listing.users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_list_groups_fills_pool_id() {
        let (directory, _temp) = create_test_directory();

        let listing = directory.list_groups("eu-west-1_pool").unwrap();
        assert_eq!(listing.groups.len(), 1);
        assert_eq!(
            listing.groups[0].user_pool_id.as_deref(),
            Some("eu-west-1_pool")
        );
    }

    #[test]
    fn test_missing_pool() {
        let (directory, _temp) = create_test_directory();

        let err = directory.list_users("missing").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("ResourceNotFoundException"));
    }

    #[test]
    fn test_rejects_pool_ids_outside_export_dir() {
        let (directory, temp) = create_test_directory();
        std::fs::write(temp.path().join("outside.json"), r#"{"users": []}"#).unwrap();
        let nested = LocalDirectory::new(temp.path().join("cognito"));

        for pool_id in ["../outside", "a/b", "", "/etc/passwd"] {
            let err = nested.list_users(pool_id).unwrap_err();
            assert_eq!(err.code.as_deref(), Some("InvalidParameterException"), "{}", pool_id);
        }
        assert!(directory.export_path("..").is_err());
    }

    #[test]
    fn test_corrupt_export() {
        let (directory, _temp) = create_test_directory();
        std::fs::write(directory.export_path("broken").unwrap(), "not json").unwrap();

        let err = directory.list_groups("broken").unwrap_err();
        assert_eq!(err.service, "cognito-idp");
        assert!(err.code.is_none());
    }
}
