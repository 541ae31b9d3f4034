//! Invocation event and response records
//!
//! The event carries per-invocation overrides for the configuration. Every
//! field is optional: strings may be absent or empty, and the retention
//! settings keep "not provided" apart from "provided as false/zero".

use serde::{Deserialize, Deserializer, Serialize};

/// Configuration overrides passed with an invocation
///
/// A `null` string counts as absent. Besides the canonical names, each
/// field accepts its lowercase form and a few common casing variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    #[serde(
        default,
        rename = "awsRegion",
        alias = "awsregion",
        alias = "AwsRegion",
        alias = "AWSRegion",
        deserialize_with = "null_as_empty"
    )]
    pub region: String,

    #[serde(
        default,
        rename = "cognitoUserPoolID",
        alias = "cognitoUserPoolId",
        alias = "cognitouserpoolid",
        alias = "CognitoUserPoolID",
        alias = "CognitoUserPoolId",
        deserialize_with = "null_as_empty"
    )]
    pub user_pool_id: String,

    #[serde(
        default,
        rename = "cognitoRegion",
        alias = "cognitoregion",
        alias = "CognitoRegion",
        deserialize_with = "null_as_empty"
    )]
    pub user_pool_region: String,

    #[serde(
        default,
        rename = "s3BucketName",
        alias = "s3bucketname",
        alias = "S3BucketName",
        deserialize_with = "null_as_empty"
    )]
    pub bucket_name: String,

    #[serde(
        default,
        rename = "s3BucketRegion",
        alias = "s3bucketregion",
        alias = "S3BucketRegion",
        deserialize_with = "null_as_empty"
    )]
    pub bucket_region: String,

    #[serde(
        default,
        rename = "kmsKeyName",
        alias = "kmskeyname",
        alias = "KmsKeyName",
        alias = "KMSKeyName",
        deserialize_with = "null_as_empty"
    )]
    pub key_id: String,

    #[serde(
        default,
        rename = "kmsRegion",
        alias = "kmsregion",
        alias = "KmsRegion",
        alias = "KMSRegion",
        deserialize_with = "null_as_empty"
    )]
    pub key_region: String,

    #[serde(
        default,
        alias = "backupprefix",
        alias = "BackupPrefix",
        deserialize_with = "null_as_empty"
    )]
    pub backup_prefix: String,

    /// Unset / false / true
    #[serde(
        default,
        rename = "rotationEnabled",
        alias = "rotationenabled",
        alias = "RotationEnabled"
    )]
    pub retention_enabled: Option<bool>,

    #[serde(
        default,
        rename = "rotationDaysLimit",
        alias = "rotationdayslimit",
        alias = "RotationDaysLimit"
    )]
    pub retention_days: Option<i64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result record returned to the invoking host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "answer")]
    pub message: String,
}

impl Response {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
