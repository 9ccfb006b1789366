//! Centralized error handling.
//!
//! Provides a unified error type for the entire application. Directory and
//! configuration failures are fatal to a run; store write failures are
//! recorded per entity by the sync orchestrator.

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // Directory
    #[error("Not connected to the directory")]
    NotConnected,

    #[error("Directory error: {0}")]
    Directory(#[from] ldap3::LdapError),

    #[error("Directory operation failed: {0}")]
    DirectoryOperation(String),

    // Store writes
    #[error("User {member} is already a member of group {group}")]
    DuplicateMembership { group: String, member: String },

    #[error("Failed to create group {group}: {reason}")]
    GroupCreationFailed { group: String, reason: String },

    #[error("Failed to write membership of {member} in {group}: {reason}")]
    MembershipWriteFailed {
        group: String,
        member: String,
        reason: String,
    },

    // External service errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    // Run outcome
    #[error("Sync finished with {0} failure(s)")]
    SyncIncomplete(usize),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get a stable error code for reports and logs
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            AppError::NotConnected => "NOT_CONNECTED",
            AppError::Directory(_) | AppError::DirectoryOperation(_) => "DIRECTORY_ERROR",
            AppError::DuplicateMembership { .. } => "DUPLICATE_MEMBERSHIP",
            AppError::GroupCreationFailed { .. } => "GROUP_CREATION_FAILED",
            AppError::MembershipWriteFailed { .. } => "MEMBERSHIP_WRITE_FAILED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::SyncIncomplete(_) => "SYNC_INCOMPLETE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::InvalidConfiguration(_)
                | AppError::NotConnected
                | AppError::Directory(_)
                | AppError::DirectoryOperation(_)
        )
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        AppError::InvalidConfiguration(msg.into())
    }

    pub fn directory_operation(msg: impl Into<String>) -> Self {
        AppError::DirectoryOperation(msg.into())
    }

    pub fn duplicate_membership(group: impl Into<String>, member: impl Into<String>) -> Self {
        AppError::DuplicateMembership {
            group: group.into(),
            member: member.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
