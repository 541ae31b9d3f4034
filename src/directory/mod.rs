//! Directory service access
//!
//! The directory pool holds the user and group records that get backed up.
//! `DirectoryService` is the seam to the identity provider; `LocalDirectory`
//! serves pool exports from the local cloud root.

mod local;
mod models;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub use local::{LocalDirectory, PoolExport};
pub use models::{AttributeType, GroupListing, GroupType, UserListing, UserType};

/// The kinds of directory resources captured by a backup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Users,
    Groups,
}

impl ResourceKind {
    /// Every kind, in backup order
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Users, ResourceKind::Groups];

    /// Object name used for this kind inside a backup folder
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Users => "users.json",
            Self::Groups => "groups.json",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Users => write!(f, "users"),
            Self::Groups => write!(f, "groups"),
        }
    }
}

/// Read access to a directory pool
#[cfg_attr(test, mockall::automock)]
pub trait DirectoryService {
    /// List every user in the pool
    fn list_users(&self, pool_id: &str) -> Result<UserListing, ServiceError>;

    /// List every group in the pool
    fn list_groups(&self, pool_id: &str) -> Result<GroupListing, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(ResourceKind::Users.file_name(), "users.json");
        assert_eq!(ResourceKind::Groups.file_name(), "groups.json");
    }

    #[test]
    fn test_backup_order() {
        assert_eq!(ResourceKind::ALL, [ResourceKind::Users, ResourceKind::Groups]);
        assert_eq!(ResourceKind::Groups.to_string(), "groups");
    }
}
