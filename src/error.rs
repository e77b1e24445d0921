//! Error types for the catalog core

use thiserror::Error;

use crate::models::CopyStatus;

/// Stable numeric codes handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    PermissionDenied = 2,
    DbFailure = 3,
    NotFound = 5,
    InvalidState = 7,
    DuplicateName = 8,
    DuplicateIsbn = 16,
    BadValue = 18,
    ReferencedEntity = 21,
    Conflict = 22,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// `rule` is a machine-readable code such as `length`, `blank` or `not_future`
    #[error("Validation error: {field} ({rule})")]
    Validation { field: String, rule: String },

    #[error("Duplicate {field}: {value}")]
    DuplicateName { field: &'static str, value: String },

    #[error("Duplicate ISBN: {0}")]
    DuplicateIsbn(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} {id} is still referenced by {dependents}")]
    ReferencedEntity {
        entity: &'static str,
        id: String,
        dependents: &'static str,
    },

    #[error("Permission denied: {caller} lacks {capability}")]
    PermissionDenied {
        caller: String,
        capability: &'static str,
    },

    #[error("Invalid state: cannot {action} {id} while {status}")]
    InvalidState {
        id: String,
        status: CopyStatus,
        action: &'static str,
    },

    #[error("Conflict: {id} expected version {expected}, found {found}")]
    Conflict { id: String, expected: i64, found: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, rule: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            rule: rule.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::BadValue,
            AppError::DuplicateName { .. } => ErrorCode::DuplicateName,
            AppError::DuplicateIsbn(_) => ErrorCode::DuplicateIsbn,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::ReferencedEntity { .. } => ErrorCode::ReferencedEntity,
            AppError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            AppError::InvalidState { .. } => ErrorCode::InvalidState,
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorCode::DbFailure
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                ErrorCode::Failure
            }
        }
    }
}

/// Reports the first failing field, by name, and its validator code
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        errors
            .field_errors()
            .into_iter()
            .min_by(|a, b| a.0.cmp(&b.0))
            .map(|(field, errs)| {
                let rule = errs
                    .first()
                    .map(|e| e.code.to_string())
                    .unwrap_or_else(|| "invalid".to_string());
                AppError::validation(field.to_string(), rule)
            })
            .unwrap_or_else(|| AppError::validation("", "invalid"))
    }
}

/// Returns true when a database error comes from a unique index
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
