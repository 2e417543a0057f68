//! Error types for user sharing operations
//!
//! This module defines the error taxonomy for share/unshare orchestration and
//! shared-access queries. Input errors are detected before any downstream
//! call is made; propagation and query errors come from the downstream engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User sharing error types.
///
/// Every variant maps to a stable machine-readable code (see
/// [`SharingError::error_code`]) and an HTTP status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SharingError {
    /// No user criteria, or an empty user id list
    #[error("User criteria must contain at least one user id")]
    MissingUserCriteria,

    /// A user id is blank
    #[error("Invalid user id: {0:?}")]
    BlankUserId(String),

    /// No organizations were named in a selective operation
    #[error("At least one organization must be specified")]
    MissingOrganizations,

    /// An organization id is blank
    #[error("Invalid organization id: {0:?}")]
    BlankOrganizationId(String),

    /// A requested role is malformed
    #[error("Invalid role {role:?}: {reason}")]
    InvalidRole {
        /// Role display name as supplied
        role: String,
        /// What is wrong with it
        reason: String,
    },

    /// Both `after` and `before` cursors were supplied
    #[error("Only one of 'after' or 'before' may be supplied")]
    ConflictingCursors,

    /// `limit` is not a positive integer
    #[error("Invalid limit: {0}")]
    InvalidLimit(i64),

    /// `limit` is not supported by this deployment
    #[error("Unsupported parameter limit: {0}")]
    UnsupportedLimit(i64),

    /// `offset` is not supported
    #[error("Unsupported parameter offset: {0}")]
    UnsupportedOffset(i64),

    /// `sortOrder` is not supported
    #[error("Unsupported parameter sortOrder: {0}")]
    UnsupportedSortOrder(String),

    /// `sortBy` is not supported
    #[error("Unsupported parameter sortBy: {0}")]
    UnsupportedSortBy(String),

    /// Every propagation unit of a batch failed
    #[error("Propagation failed for all {failed} units")]
    PropagationFailed {
        /// Number of failed units
        failed: usize,
    },

    /// The downstream shared-access query failed
    #[error("Shared access query failed: {0}")]
    QueryFailed(String),
}

/// Result type for user sharing operations.
pub type SharingResult<T> = Result<T, SharingError>;

impl SharingError {
    /// Check if this error is the server's fault rather than the caller's.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            SharingError::PropagationFailed { .. } | SharingError::QueryFailed(_)
        )
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        if self.is_server_error() {
            500
        } else {
            400
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            SharingError::MissingUserCriteria => "USM-60001",
            SharingError::BlankUserId(_) => "USM-60002",
            SharingError::MissingOrganizations => "USM-60003",
            SharingError::BlankOrganizationId(_) => "USM-60004",
            SharingError::InvalidRole { .. } => "USM-60005",
            SharingError::ConflictingCursors => "USM-60006",
            SharingError::InvalidLimit(_) => "USM-60007",
            SharingError::UnsupportedLimit(_) => "USM-60008",
            SharingError::UnsupportedOffset(_) => "USM-60009",
            SharingError::UnsupportedSortOrder(_) => "USM-60010",
            SharingError::UnsupportedSortBy(_) => "USM-60011",
            SharingError::PropagationFailed { .. } => "USM-65001",
            SharingError::QueryFailed(_) => "USM-65002",
        }
    }

    /// Get the short, value-free summary for API responses.
    pub fn message(&self) -> &'static str {
        match self {
            SharingError::MissingUserCriteria | SharingError::BlankUserId(_) => {
                "Invalid user criteria."
            }
            SharingError::MissingOrganizations | SharingError::BlankOrganizationId(_) => {
                "Invalid organizations."
            }
            SharingError::InvalidRole { .. } => "Invalid role.",
            SharingError::ConflictingCursors | SharingError::InvalidLimit(_) => {
                "Invalid pagination parameters."
            }
            SharingError::UnsupportedLimit(_)
            | SharingError::UnsupportedOffset(_)
            | SharingError::UnsupportedSortOrder(_)
            | SharingError::UnsupportedSortBy(_) => "Unsupported param.",
            SharingError::PropagationFailed { .. } => "Unable to share or unshare users.",
            SharingError::QueryFailed(_) => "Unable to retrieve shared access.",
        }
    }

    /// Convert into the wire error body.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.message().to_string(),
            description: self.to_string(),
        }
    }
}

/// Error body returned to API callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Stable machine-readable code
    pub code: String,

    /// Short summary
    pub message: String,

    /// Human-readable detail, including the offending value when there is one
    pub description: String,
}

/// Failure of a single propagation call.
///
/// Returned by [`crate::port::PolicyPropagationPort`] implementations and
/// recorded per unit in a [`crate::outcome::BatchOutcome`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PropagationError {
    /// The engine refused the unit (unknown user, unknown org, bad role...)
    #[error("Propagation rejected: {0}")]
    Rejected(String),

    /// The engine could not be reached or is overloaded
    #[error("Propagation engine unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured time
    #[error("Propagation timed out after {0} ms")]
    Timeout(u64),

    /// Anything else
    #[error("Propagation error: {0}")]
    Internal(String),
}

/// Result type for propagation calls.
pub type PropagationResult<T> = Result<T, PropagationError>;

impl PropagationError {
    /// Get error code for batch reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            PropagationError::Rejected(_) => "PROPAGATION_REJECTED",
            PropagationError::Unavailable(_) => "ENGINE_UNAVAILABLE",
            PropagationError::Timeout(_) => "PROPAGATION_TIMEOUT",
            PropagationError::Internal(_) => "PROPAGATION_ERROR",
        }
    }

    /// Check if retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PropagationError::Unavailable(_) | PropagationError::Timeout(_)
        )
    }
}

/// Failure of a downstream shared-access query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The store rejected the query (bad filter expression, stale cursor...)
    #[error("Query rejected: {0}")]
    Rejected(String),

    /// The store could not be reached
    #[error("Shared access source unavailable: {0}")]
    Unavailable(String),

    /// Anything else
    #[error("Shared access source error: {0}")]
    Internal(String),
}

impl From<SourceError> for SharingError {
    fn from(err: SourceError) -> Self {
        SharingError::QueryFailed(err.to_string())
    }
}
