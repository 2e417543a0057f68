//! Batch outcomes
//!
//! Every propagation unit produces a [`UnitResult`]; the orchestrator folds
//! them into a [`BatchOutcome`] so that partial failure is visible to the
//! caller, unit by unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PropagationError;

/// Which orchestrator operation produced a unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SharingOperation {
    /// Share into named organizations
    SelectiveShare,

    /// Share into all organizations under a policy
    GeneralShare,

    /// Unshare from named organizations
    SelectiveUnshare,

    /// Unshare from all organizations
    GeneralUnshare,
}

impl SharingOperation {
    /// Get string representation of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectiveShare => "selective_share",
            Self::GeneralShare => "general_share",
            Self::SelectiveUnshare => "selective_unshare",
            Self::GeneralUnshare => "general_unshare",
        }
    }
}

impl std::fmt::Display for SharingOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a propagation unit.
///
/// `organization_id` is set only for selective share units, which are the
/// only ones addressed to a single organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitKey {
    /// Operation the unit belongs to
    pub operation: SharingOperation,

    /// User the unit is for
    pub user_id: String,

    /// Organization the unit is for, if it targets exactly one
    pub organization_id: Option<String>,
}

impl UnitKey {
    /// Key for a unit addressed to a user only.
    pub fn user(operation: SharingOperation, user_id: impl Into<String>) -> Self {
        Self {
            operation,
            user_id: user_id.into(),
            organization_id: None,
        }
    }

    /// Key for a unit addressed to a (user, organization) pair.
    pub fn user_in_org(
        operation: SharingOperation,
        user_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            user_id: user_id.into(),
            organization_id: Some(organization_id.into()),
        }
    }
}

/// What happened to a single unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// The engine accepted the unit
    Succeeded,

    /// The engine call failed, timed out, or was rejected
    Failed(PropagationError),
}

/// Result of dispatching one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitResult {
    /// Which unit
    pub key: UnitKey,

    /// How it went
    pub status: UnitStatus,
}

impl UnitResult {
    /// Check if the unit succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.status, UnitStatus::Succeeded)
    }

    /// The failure cause, if the unit failed.
    pub fn error(&self) -> Option<&PropagationError> {
        match &self.status {
            UnitStatus::Succeeded => None,
            UnitStatus::Failed(err) => Some(err),
        }
    }
}

/// Overall classification of a batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every unit succeeded
    Succeeded,

    /// Some units succeeded, some failed
    PartiallyFailed,

    /// Every unit failed
    Failed,
}

/// Aggregate result of a share/unshare request.
///
/// Results are kept in dispatch order (users, then organizations, as given
/// in the request) regardless of how units were scheduled.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Correlation ID for logs and reports
    pub batch_id: Uuid,

    /// Operation performed
    pub operation: SharingOperation,

    /// One entry per unit
    pub results: Vec<UnitResult>,

    /// When dispatch started
    pub started_at: DateTime<Utc>,

    /// When the last unit finished
    pub completed_at: DateTime<Utc>,
}

impl BatchOutcome {
    /// Total number of units.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of units that succeeded.
    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of units that failed.
    pub fn failed_count(&self) -> usize {
        self.total() - self.succeeded_count()
    }

    /// Units that failed.
    pub fn failures(&self) -> impl Iterator<Item = &UnitResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Classify the batch.
    pub fn status(&self) -> BatchStatus {
        match (self.succeeded_count(), self.failed_count()) {
            (_, 0) => BatchStatus::Succeeded,
            (0, _) => BatchStatus::Failed,
            _ => BatchStatus::PartiallyFailed,
        }
    }

    /// Check if every unit succeeded.
    pub fn is_complete_success(&self) -> bool {
        self.status() == BatchStatus::Succeeded
    }

    /// Check if every unit failed.
    pub fn is_total_failure(&self) -> bool {
        self.status() == BatchStatus::Failed
    }

    /// Build the serializable report handed back to API callers.
    pub fn report(&self) -> BatchReport {
        BatchReport {
            batch_id: self.batch_id,
            operation: self.operation,
            status: self.status(),
            total: self.total(),
            succeeded: self.succeeded_count(),
            failed: self.failed_count(),
            failures: self
                .failures()
                .filter_map(|r| {
                    r.error().map(|err| UnitFailure {
                        user_id: r.key.user_id.clone(),
                        org_id: r.key.organization_id.clone(),
                        code: err.error_code().to_string(),
                        description: err.to_string(),
                    })
                })
                .collect(),
        }
    }
}

/// Serializable summary of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Correlation ID
    pub batch_id: Uuid,

    /// Operation performed
    pub operation: SharingOperation,

    /// Overall classification
    pub status: BatchStatus,

    /// Number of units
    pub total: usize,

    /// Number of units that succeeded
    pub succeeded: usize,

    /// Number of units that failed
    pub failed: usize,

    /// Failed units
    pub failures: Vec<UnitFailure>,
}

/// A failed unit as reported to API callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnitFailure {
    /// User the unit was for
    pub user_id: String,

    /// Organization the unit was for, if it targeted exactly one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,

    /// Failure code
    pub code: String,

    /// Failure detail
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(results: Vec<UnitResult>) -> BatchOutcome {
        let now = Utc::now();
        BatchOutcome {
            batch_id: Uuid::now_v7(),
            operation: SharingOperation::SelectiveShare,
            results,
            started_at: now,
            completed_at: now,
        }
    }

    fn ok(user: &str, org: &str) -> UnitResult {
        UnitResult {
            key: UnitKey::user_in_org(SharingOperation::SelectiveShare, user, org),
            status: UnitStatus::Succeeded,
        }
    }

    fn failed(user: &str, org: &str) -> UnitResult {
        UnitResult {
            key: UnitKey::user_in_org(SharingOperation::SelectiveShare, user, org),
            status: UnitStatus::Failed(PropagationError::Rejected("unknown org".to_string())),
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(outcome(vec![ok("u1", "o1")]).status(), BatchStatus::Succeeded);
        assert_eq!(
            outcome(vec![ok("u1", "o1"), failed("u2", "o1")]).status(),
            BatchStatus::PartiallyFailed
        );
        assert_eq!(outcome(vec![failed("u1", "o1")]).status(), BatchStatus::Failed);
    }

    #[test]
    fn test_report_lists_only_failed_units() {
        let batch = outcome(vec![ok("u1", "o1"), failed("u1", "o2"), ok("u2", "o1")]);
        let report = batch.report();

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            report.failures,
            vec![UnitFailure {
                user_id: "u1".to_string(),
                org_id: Some("o2".to_string()),
                code: "PROPAGATION_REJECTED".to_string(),
                description: "Propagation rejected: unknown org".to_string(),
            }]
        );
    }

    #[test]
    fn test_report_serialization() {
        let batch = outcome(vec![failed("u1", "o1")]);
        let json = serde_json::to_value(batch.report()).unwrap();

        assert_eq!(json["operation"], "selective_share");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failures"][0]["orgId"], "o1");
    }
}
