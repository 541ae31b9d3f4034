//! Directory records as returned by a pool listing
//!
//! Field names follow the identity provider's wire format (PascalCase) so a
//! decrypted snapshot reads the same as a raw API response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single user attribute (e.g. `email`, `sub`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl AttributeType {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// A user in the directory pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserType {
    pub username: String,

    #[serde(default)]
    pub attributes: Vec<AttributeType>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Account status (e.g. `CONFIRMED`, `FORCE_CHANGE_PASSWORD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_create_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_last_modified_date: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

impl UserType {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            attributes: Vec::new(),
            enabled: true,
            user_status: None,
            user_create_date: None,
            user_last_modified_date: None,
        }
    }

    /// Look up an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }
}

/// A group in the directory pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupType {
    pub group_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedence: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl GroupType {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            user_pool_id: None,
            description: None,
            role_arn: None,
            precedence: None,
            creation_date: None,
            last_modified_date: None,
        }
    }
}

/// Result of listing users
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserListing {
    #[serde(default)]
    pub users: Vec<UserType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_token: Option<String>,
}

/// Result of listing groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupListing {
    #[serde(default)]
    pub groups: Vec<GroupType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}
