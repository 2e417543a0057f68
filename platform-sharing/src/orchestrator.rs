//! Share orchestration
//!
//! This module turns share/unshare requests into propagation units and
//! dispatches them to the [`PolicyPropagationPort`].
//!
//! ## Unit fan-out
//!
//! ```text
//! share_selective     users × organizations  → SelectiveShareUnit
//! share_with_all      users                  → GeneralShareUnit
//! unshare_selective   users                  → SelectiveUnshareUnit (all org ids)
//! unshare_with_all    users                  → GeneralUnshareUnit
//! ```
//!
//! Input is validated in full before the first unit is dispatched, so an
//! invalid request never reaches the engine. Once dispatch starts, every
//! unit is attempted and its result recorded in the [`BatchOutcome`].

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::{ConfigError, SharingConfig};
use crate::dispatch::{dispatch_units, DispatchConfig};
use crate::error::{PropagationResult, SharingError, SharingResult};
use crate::models::{
    GeneralShareUnit, GeneralUnshareUnit, OrganizationShare, RoleAudienceSpec,
    SelectiveShareUnit, SelectiveUnshareUnit, SharedRole, SharingPolicy, UserCriteria,
};
use crate::outcome::{BatchOutcome, SharingOperation, UnitKey, UnitResult};
use crate::port::PolicyPropagationPort;
use crate::roles::resolve_roles;

/// Fans share/unshare requests out to the propagation engine.
///
/// # Examples
///
/// ```rust,no_run
/// use platform_sharing::{OrganizationShare, PolicyPropagationPort, ShareOrchestrator, UserCriteria};
/// use std::sync::Arc;
///
/// async fn share(port: Arc<dyn PolicyPropagationPort>) {
///     let orchestrator = ShareOrchestrator::new(port);
///     let users = UserCriteria::new(vec!["u1".to_string(), "u2".to_string()]).unwrap();
///     let orgs = vec![OrganizationShare::new("o1", vec![])];
///
///     let outcome = orchestrator.share_selective(&users, &orgs).await.unwrap();
///     println!("{} of {} units failed", outcome.failed_count(), outcome.total());
/// }
/// ```
#[derive(Clone)]
pub struct ShareOrchestrator {
    /// Propagation engine
    port: Arc<dyn PolicyPropagationPort>,

    /// Scheduling limits
    dispatch: DispatchConfig,
}

impl std::fmt::Debug for ShareOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareOrchestrator")
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

impl ShareOrchestrator {
    /// Create an orchestrator with default dispatch limits.
    pub fn new(port: Arc<dyn PolicyPropagationPort>) -> Self {
        Self::with_dispatch(port, DispatchConfig::default())
    }

    /// Create an orchestrator from sharing configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a zero concurrency or unit timeout.
    pub fn from_config(
        port: Arc<dyn PolicyPropagationPort>,
        config: &SharingConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_dispatch(port, DispatchConfig::from(config)))
    }

    /// Create an orchestrator with explicit dispatch limits.
    pub fn with_dispatch(port: Arc<dyn PolicyPropagationPort>, dispatch: DispatchConfig) -> Self {
        Self { port, dispatch }
    }

    /// Share users into specific organizations.
    ///
    /// Roles are resolved per organization, since each organization entry
    /// carries its own role list. One unit per (user, organization).
    ///
    /// # Errors
    ///
    /// - [`SharingError::MissingOrganizations`] if `organizations` is empty
    /// - [`SharingError::BlankOrganizationId`] for a blank org id
    /// - [`SharingError::InvalidRole`] if any role cannot be resolved
    #[instrument(skip_all, fields(users = users.len(), organizations = organizations.len()))]
    pub async fn share_selective(
        &self,
        users: &UserCriteria,
        organizations: &[OrganizationShare],
    ) -> SharingResult<BatchOutcome> {
        if organizations.is_empty() {
            return Err(SharingError::MissingOrganizations);
        }

        let resolved = organizations
            .iter()
            .map(|org| {
                ensure_org_id(&org.org_id)?;
                Ok((org.org_id.as_str(), resolve_roles(&org.roles)?))
            })
            .collect::<SharingResult<Vec<(&str, Vec<SharedRole>)>>>()?;

        let units: Vec<(UnitKey, SelectiveShareUnit)> = users
            .user_ids()
            .iter()
            .flat_map(|user_id| {
                resolved.iter().map(move |(org_id, roles)| {
                    (
                        UnitKey::user_in_org(SharingOperation::SelectiveShare, user_id, *org_id),
                        SelectiveShareUnit {
                            user_id: user_id.clone(),
                            organization_id: org_id.to_string(),
                            roles: roles.clone(),
                        },
                    )
                })
            })
            .collect();

        let port = &self.port;
        self.run(SharingOperation::SelectiveShare, units, move |unit| {
            port.propagate_selective_share(unit)
        })
        .await
    }

    /// Share users into all organizations under a policy.
    ///
    /// Roles are resolved once and every user receives the same list.
    ///
    /// # Errors
    ///
    /// [`SharingError::InvalidRole`] if any role cannot be resolved.
    #[instrument(
        skip_all,
        fields(
            users = users.len(),
            policy = policy.as_str(),
            future_orgs = policy.includes_future_orgs()
        )
    )]
    pub async fn share_with_all(
        &self,
        users: &UserCriteria,
        policy: SharingPolicy,
        roles: &[RoleAudienceSpec],
    ) -> SharingResult<BatchOutcome> {
        let roles = resolve_roles(roles)?;

        let units: Vec<(UnitKey, GeneralShareUnit)> = users
            .user_ids()
            .iter()
            .map(|user_id| {
                (
                    UnitKey::user(SharingOperation::GeneralShare, user_id),
                    GeneralShareUnit {
                        user_id: user_id.clone(),
                        sharing_policy: policy,
                        roles: roles.clone(),
                    },
                )
            })
            .collect();

        let port = &self.port;
        self.run(SharingOperation::GeneralShare, units, move |unit| {
            port.propagate_general_share(unit)
        })
        .await
    }

    /// Unshare users from specific organizations.
    ///
    /// One unit per user, each carrying the full organization list.
    ///
    /// # Errors
    ///
    /// - [`SharingError::MissingOrganizations`] if `organization_ids` is empty
    /// - [`SharingError::BlankOrganizationId`] for a blank org id
    #[instrument(skip_all, fields(users = users.len(), organizations = organization_ids.len()))]
    pub async fn unshare_selective(
        &self,
        users: &UserCriteria,
        organization_ids: &[String],
    ) -> SharingResult<BatchOutcome> {
        if organization_ids.is_empty() {
            return Err(SharingError::MissingOrganizations);
        }
        for org_id in organization_ids {
            ensure_org_id(org_id)?;
        }

        let units: Vec<(UnitKey, SelectiveUnshareUnit)> = users
            .user_ids()
            .iter()
            .map(|user_id| {
                (
                    UnitKey::user(SharingOperation::SelectiveUnshare, user_id),
                    SelectiveUnshareUnit {
                        user_id: user_id.clone(),
                        organization_ids: organization_ids.to_vec(),
                    },
                )
            })
            .collect();

        let port = &self.port;
        self.run(SharingOperation::SelectiveUnshare, units, move |unit| {
            port.propagate_selective_unshare(unit)
        })
        .await
    }

    /// Unshare users from every organization.
    #[instrument(skip_all, fields(users = users.len()))]
    pub async fn unshare_with_all(&self, users: &UserCriteria) -> SharingResult<BatchOutcome> {
        let units: Vec<(UnitKey, GeneralUnshareUnit)> = users
            .user_ids()
            .iter()
            .map(|user_id| {
                (
                    UnitKey::user(SharingOperation::GeneralUnshare, user_id),
                    GeneralUnshareUnit {
                        user_id: user_id.clone(),
                    },
                )
            })
            .collect();

        let port = &self.port;
        self.run(SharingOperation::GeneralUnshare, units, move |unit| {
            port.propagate_general_unshare(unit)
        })
        .await
    }

    async fn run<U, F, Fut>(
        &self,
        operation: SharingOperation,
        units: Vec<(UnitKey, U)>,
        call: F,
    ) -> SharingResult<BatchOutcome>
    where
        F: Fn(U) -> Fut,
        Fut: Future<Output = PropagationResult<()>>,
    {
        let batch_id = Uuid::now_v7();
        let started_at = Utc::now();

        let results: Vec<UnitResult> = dispatch_units(units, self.dispatch, call).await;

        let outcome = BatchOutcome {
            batch_id,
            operation,
            results,
            started_at,
            completed_at: Utc::now(),
        };

        if outcome.is_total_failure() {
            error!(
                batch_id = %batch_id,
                operation = %operation,
                failed = outcome.failed_count(),
                "Propagation failed for every unit"
            );
        } else {
            info!(
                batch_id = %batch_id,
                operation = %operation,
                succeeded = outcome.succeeded_count(),
                failed = outcome.failed_count(),
                "Propagation batch completed"
            );
        }

        Ok(outcome)
    }
}

fn ensure_org_id(org_id: &str) -> SharingResult<()> {
    if org_id.trim().is_empty() {
        return Err(SharingError::BlankOrganizationId(org_id.to_string()));
    }
    Ok(())
}
