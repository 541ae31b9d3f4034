//! Configuration resolution
//!
//! Merges the environment snapshot and the optional invocation event into a
//! validated [`BackupConfig`]. For every field a non-empty event value wins
//! over the environment; required fields that end up empty fail resolution.

use serde::Serialize;
use tracing::{warn, Span};

use super::environment::Environment;
use super::event::InvocationEvent;
use crate::error::{BackupError, BackupResult};

/// Environment variable names
pub mod env_vars {
    pub const REGION: &str = "AWS_REGION";
    pub const USER_POOL_ID: &str = "COGNITO_USER_POOL_ID";
    pub const USER_POOL_REGION: &str = "COGNITO_REGION";
    pub const BUCKET_NAME: &str = "S3_BUCKET_NAME";
    pub const BUCKET_REGION: &str = "S3_BUCKET_REGION";
    pub const BACKUP_PREFIX: &str = "BACKUP_PREFIX";
    pub const RETENTION_ENABLED: &str = "ROTATION_ENABLED";
    pub const RETENTION_DAYS: &str = "ROTATION_DAYS_LIMIT";
    pub const KEY_ID: &str = "KMS_KEY_NAME";
    pub const KEY_REGION: &str = "KMS_REGION";
}

/// A string setting and where it can come from
struct Field {
    env_var: &'static str,
    event_field: &'static str,
}

const REGION: Field = Field {
    env_var: env_vars::REGION,
    event_field: "awsRegion",
};
const USER_POOL_ID: Field = Field {
    env_var: env_vars::USER_POOL_ID,
    event_field: "cognitoUserPoolID",
};
const USER_POOL_REGION: Field = Field {
    env_var: env_vars::USER_POOL_REGION,
    event_field: "cognitoRegion",
};
const BUCKET_NAME: Field = Field {
    env_var: env_vars::BUCKET_NAME,
    event_field: "s3BucketName",
};
const BUCKET_REGION: Field = Field {
    env_var: env_vars::BUCKET_REGION,
    event_field: "s3BucketRegion",
};
const BACKUP_PREFIX: Field = Field {
    env_var: env_vars::BACKUP_PREFIX,
    event_field: "backupPrefix",
};
const KEY_ID: Field = Field {
    env_var: env_vars::KEY_ID,
    event_field: "kmsKeyName",
};
const KEY_REGION: Field = Field {
    env_var: env_vars::KEY_REGION,
    event_field: "kmsRegion",
};

/// Backup rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Retention {
    Disabled,
    /// Delete objects at least `days` old; `days` is always positive
    Enabled { days: u64 },
}

impl Retention {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    /// Age threshold in days, if rotation is enabled
    pub fn days(&self) -> Option<u64> {
        match self {
            Self::Enabled { days } => Some(*days),
            Self::Disabled => None,
        }
    }
}

/// Fully resolved configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupConfig {
    pub region: String,
    pub user_pool_id: String,
    pub user_pool_region: String,
    pub bucket_name: String,
    pub bucket_region: String,
    pub key_id: String,
    pub key_region: String,
    /// May be empty
    pub backup_prefix: String,
    pub retention: Retention,
}

/// Resolves [`BackupConfig`] from an environment snapshot and an optional event
pub struct ConfigResolver {
    env: Environment,
    span: Span,
}

impl ConfigResolver {
    /// Create a resolver logging into `span`
    pub fn new(env: Environment, span: Span) -> Self {
        Self { env, span }
    }

    /// Resolve and validate the configuration
    ///
    /// Fields are processed in a fixed order and the first failure is
    /// returned.
    pub fn resolve(&self, event: Option<&InvocationEvent>) -> BackupResult<BackupConfig> {
        self.span.in_scope(|| {
            let region = self.required(&REGION, event.map(|e| e.region.as_str()))?;
            let user_pool_id =
                self.required(&USER_POOL_ID, event.map(|e| e.user_pool_id.as_str()))?;
            let user_pool_region =
                self.required(&USER_POOL_REGION, event.map(|e| e.user_pool_region.as_str()))?;
            let bucket_name =
                self.required(&BUCKET_NAME, event.map(|e| e.bucket_name.as_str()))?;
            let bucket_region =
                self.required(&BUCKET_REGION, event.map(|e| e.bucket_region.as_str()))?;
            let backup_prefix =
                self.merged(&BACKUP_PREFIX, event.map(|e| e.backup_prefix.as_str()));
            let retention = self.retention(event)?;
            let key_id = self.required(&KEY_ID, event.map(|e| e.key_id.as_str()))?;
            let key_region = self.required(&KEY_REGION, event.map(|e| e.key_region.as_str()))?;

            Ok(BackupConfig {
                region,
                user_pool_id,
                user_pool_region,
                bucket_name,
                bucket_region,
                key_id,
                key_region,
                backup_prefix,
                retention,
            })
        })
    }

    /// Environment value overridden by a non-empty event value
    fn merged(&self, field: &Field, event_value: Option<&str>) -> String {
        let mut value = String::new();

        let env_value = self.env.get(field.env_var);
        if env_value.is_empty() {
            warn!(env_var = field.env_var, "Environment variable {} is empty", field.env_var);
        } else {
            value = env_value.to_string();
        }

        if let Some(event_value) = event_value {
            if event_value.is_empty() {
                warn!(
                    event_field = field.event_field,
                    "Event contains empty {} variable", field.event_field
                );
            } else {
                value = event_value.to_string();
            }
        }

        value
    }

    fn required(&self, field: &Field, event_value: Option<&str>) -> BackupResult<String> {
        let value = self.merged(field, event_value);
        if value.is_empty() {
            return Err(BackupError::missing_field(
                field.event_field,
                field.env_var,
                field.event_field,
            ));
        }
        Ok(value)
    }

    fn retention(&self, event: Option<&InvocationEvent>) -> BackupResult<Retention> {
        let mut enabled = None;

        let raw = self.env.get(env_vars::RETENTION_ENABLED);
        if raw.is_empty() {
            warn!(
                env_var = env_vars::RETENTION_ENABLED,
                "Environment variable {} is empty",
                env_vars::RETENTION_ENABLED
            );
        } else {
            enabled = Some(parse_bool(raw).ok_or_else(|| {
                BackupError::Config(format!(
                    "Could not parse '{}' variable: invalid boolean '{}'",
                    env_vars::RETENTION_ENABLED,
                    raw
                ))
            })?);
        }

        if let Some(event) = event {
            match event.retention_enabled {
                Some(value) => enabled = Some(value),
                None => warn!("Event does not specify rotationEnabled"),
            }
        }

        let enabled = enabled.unwrap_or_else(|| {
            warn!("rotationEnabled is not specified, rotation will be disabled");
            false
        });
        if !enabled {
            return Ok(Retention::Disabled);
        }

        let mut days = 0;

        let raw = self.env.get(env_vars::RETENTION_DAYS);
        if raw.is_empty() {
            warn!(
                env_var = env_vars::RETENTION_DAYS,
                "Environment variable {} is empty",
                env_vars::RETENTION_DAYS
            );
        } else {
            days = raw.parse::<i64>().map_err(|e| {
                BackupError::Config(format!(
                    "Could not parse '{}' variable: {}",
                    env_vars::RETENTION_DAYS,
                    e
                ))
            })?;
        }

        // An explicit event value wins even when it is zero
        if let Some(event) = event {
            match event.retention_days {
                Some(value) => days = value,
                None => warn!("Event does not specify rotationDaysLimit"),
            }
        }

        if days <= 0 {
            return Err(BackupError::Config(format!(
                "rotationDaysLimit should be greater than 0, got {}",
                days
            )));
        }

        Ok(Retention::Enabled { days: days as u64 })
    }
}

/// Boolean spellings accepted for `ROTATION_ENABLED`
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
