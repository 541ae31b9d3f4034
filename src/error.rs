//! Custom error types for cognito-backup
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

use crate::directory::ResourceKind;

/// An error reported by one of the external services (directory, key
/// service, object store)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{service}: {message}")]
pub struct ServiceError {
    /// Service that produced the error
    pub service: &'static str,
    /// Diagnostic code returned by the service, if any
    pub code: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl ServiceError {
    /// Create an error without a diagnostic code
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            code: None,
            message: message.into(),
        }
    }

    /// Attach a diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// The main error type for cognito-backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required configuration field is empty in both sources
    #[error(
        "{field} is empty; configure it via '{env_var}' env variable or pass '{event_field}' in the event body"
    )]
    MissingField {
        field: &'static str,
        env_var: &'static str,
        event_field: &'static str,
    },

    /// Service clients could not be created
    #[error("Could not create service clients: {0}")]
    Connect(String),

    /// Listing the directory pool failed
    #[error("Failed to get list of cognito {kind}: {source}")]
    Directory {
        kind: ResourceKind,
        #[source]
        source: ServiceError,
    },

    /// Serializing a directory listing failed
    #[error("Failed to marshal cognito {kind} structure: {source}")]
    Serialize {
        kind: ResourceKind,
        #[source]
        source: serde_json::Error,
    },

    /// The key service rejected an encryption request
    #[error("Failed to encrypt cognito {kind}{}: {source}", code_suffix(.code))]
    Encryption {
        kind: ResourceKind,
        code: Option<String>,
        #[source]
        source: ServiceError,
    },

    /// Writing a backup object failed
    #[error("Failed to upload cognito {kind} backup to '{key}': {source}")]
    Upload {
        kind: ResourceKind,
        key: String,
        #[source]
        source: ServiceError,
    },

    /// Listing the bucket during rotation failed
    #[error("Rotation has failed: {source}")]
    Rotation {
        #[source]
        source: ServiceError,
    },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref()
        .map(|c| format!(" (code: {})", c))
        .unwrap_or_default()
}

impl BackupError {
    /// Create a "missing field" error
    pub fn missing_field(
        field: &'static str,
        env_var: &'static str,
        event_field: &'static str,
    ) -> Self {
        Self::MissingField {
            field,
            env_var,
            event_field,
        }
    }

    /// Check if this error was raised while resolving configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::MissingField { .. })
    }

    /// Diagnostic code of the underlying service error, if any
    pub fn service_code(&self) -> Option<&str> {
        match self {
            Self::Directory { source, .. }
            | Self::Upload { source, .. }
            | Self::Rotation { source } => source.code.as_deref(),
            Self::Encryption { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for cognito-backup operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = BackupError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
        assert!(err.is_config());
    }

    #[test]
    fn test_connect_error_is_not_config() {
        let err = BackupError::Connect("local cloud root /nope does not exist".into());
        assert_eq!(
            err.to_string(),
            "Could not create service clients: local cloud root /nope does not exist"
        );
        assert!(!err.is_config());
        assert_eq!(err.service_code(), None);
    }

    #[test]
    fn test_missing_field_names_both_sources() {
        let err = BackupError::missing_field("awsRegion", "AWS_REGION", "awsRegion");
        let msg = err.to_string();
        assert!(msg.contains("'AWS_REGION'"));
        assert!(msg.contains("'awsRegion'"));
        assert!(err.is_config());
    }

    #[test]
    fn test_encryption_error_carries_code() {
        let err = BackupError::Encryption {
            kind: ResourceKind::Users,
            code: Some("NotFoundException".into()),
            source: ServiceError::new("kms", "key not found").with_code("NotFoundException"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to encrypt cognito users (code: NotFoundException): kms: key not found"
        );
        assert_eq!(err.service_code(), Some("NotFoundException"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_encryption_error_without_code() {
        let err = BackupError::Encryption {
            kind: ResourceKind::Groups,
            code: None,
            source: ServiceError::new("kms", "throttled"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to encrypt cognito groups: kms: throttled"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BackupError = io_err.into();
        assert!(matches!(err, BackupError::Io(_)));
    }
}
