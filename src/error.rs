//! Error taxonomy for lifecycle use cases.
//!
//! Errors are classified by how they are surfaced:
//! - Field-targeted: validation, conflict, business-rule violations
//! - General: authorization, not-found, transient storage failures
//!
//! Everything except `Transient` is raised before the first write of a use case.

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Malformed identity number, missing required field, missing reason.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// Identity number bound to another person, duplicate national ID in a
    /// company, or a stale record version.
    #[error("{message}")]
    Conflict {
        field: Option<&'static str>,
        message: String,
    },

    /// Scope mismatch or an owner-only operation attempted by a non-owner.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Cool-down window not elapsed, national ID blacklisted.
    #[error("{message}")]
    BusinessRule { field: &'static str, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage or file I/O failure. Not retried here.
    #[error("Storage failure: {0}")]
    Transient(String),

    #[error("Request cancelled before any change was written")]
    Cancelled,
}

impl LifecycleError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(field: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn business_rule(field: &'static str, message: impl Into<String>) -> Self {
        Self::BusinessRule {
            field,
            message: message.into(),
        }
    }

    /// Field the message should be attached to, for field-targeted errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } | Self::BusinessRule { field, .. } => Some(field),
            Self::Conflict { field, .. } => *field,
            _ => None,
        }
    }

    /// Stable tag for callers that map errors to responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Conflict { .. } => "conflict",
            Self::Authorization(_) => "authorization",
            Self::BusinessRule { .. } => "business_rule",
            Self::NotFound(_) => "not_found",
            Self::Transient(_) => "transient",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<DbError> for LifecycleError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::StaleVersion { .. } => LifecycleError::Conflict {
                field: Some("version"),
                message: err.to_string(),
            },
            ref e if e.is_unique_violation() => LifecycleError::Conflict {
                field: None,
                message: format!("Record already exists: {}", e),
            },
            other => LifecycleError::Transient(other.to_string()),
        }
    }
}

impl From<std::io::Error> for LifecycleError {
    fn from(err: std::io::Error) -> Self {
        LifecycleError::Transient(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_version_maps_to_conflict() {
        let err: LifecycleError = DbError::StaleVersion {
            table: "employees",
            id: 7,
            expected: 3,
        }
        .into();
        assert_eq!(err.kind(), "conflict");
        assert_eq!(err.field(), Some("version"));
    }

    #[test]
    fn test_migration_failure_is_transient() {
        let err: LifecycleError = DbError::Migration("boom".into()).into();
        assert_eq!(err.kind(), "transient");
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_field_targeting() {
        let err = LifecycleError::validation("national_id", "must be 16 digits");
        assert_eq!(err.field(), Some("national_id"));
        assert_eq!(err.to_string(), "must be 16 digits");
        assert_eq!(LifecycleError::Authorization("x".into()).field(), None);
    }
}
