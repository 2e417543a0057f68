//! Downstream contracts
//!
//! The orchestrator and the query gateway talk to the outside world only
//! through the two traits defined here. Implementations are injected once as
//! `Arc<dyn ...>` and shared across requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PropagationResult, SourceError};
use crate::models::{
    GeneralShareUnit, GeneralUnshareUnit, SelectiveShareUnit, SelectiveUnshareUnit,
    SharedOrganizationsPage, SharedRolesPage,
};

/// Policy propagation engine.
///
/// Persists sharing relationships and cascades them through the
/// organization hierarchy. Each call handles exactly one unit; retries, if
/// any, are the implementation's business.
#[async_trait]
pub trait PolicyPropagationPort: Send + Sync {
    /// Share a user into one organization.
    async fn propagate_selective_share(&self, unit: SelectiveShareUnit) -> PropagationResult<()>;

    /// Share a user into all organizations under a policy.
    async fn propagate_general_share(&self, unit: GeneralShareUnit) -> PropagationResult<()>;

    /// Unshare a user from a set of organizations.
    async fn propagate_selective_unshare(
        &self,
        unit: SelectiveUnshareUnit,
    ) -> PropagationResult<()>;

    /// Unshare a user from every organization.
    async fn propagate_general_unshare(&self, unit: GeneralUnshareUnit) -> PropagationResult<()>;
}

/// Cursor window forwarded to the downstream store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Return items after this cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    /// Return items before this cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,

    /// Maximum number of items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Validated query for the organizations a user is shared into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedOrganizationsQuery {
    /// User whose shares are listed
    pub user_id: String,

    /// Cursor window
    #[serde(flatten)]
    pub page: PageRequest,

    /// Opaque filter expression, forwarded verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Include organizations reached through the hierarchy
    pub recursive: bool,
}

/// Validated query for the roles a user holds in one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedRolesQuery {
    /// User whose roles are listed
    pub user_id: String,

    /// Organization the roles are held in
    pub org_id: String,

    /// Cursor window
    #[serde(flatten)]
    pub page: PageRequest,

    /// Opaque filter expression, forwarded verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Include roles reached through the hierarchy
    pub recursive: bool,
}

/// Read side of the sharing store.
#[async_trait]
pub trait SharedAccessSource: Send + Sync {
    /// List organizations a user is shared into.
    async fn shared_organizations(
        &self,
        query: SharedOrganizationsQuery,
    ) -> Result<SharedOrganizationsPage, SourceError>;

    /// List roles a user holds in an organization.
    async fn shared_roles(&self, query: SharedRolesQuery) -> Result<SharedRolesPage, SourceError>;
}

/// Source used when no store is wired: every listing is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconnectedSource;

#[async_trait]
impl SharedAccessSource for UnconnectedSource {
    async fn shared_organizations(
        &self,
        _query: SharedOrganizationsQuery,
    ) -> Result<SharedOrganizationsPage, SourceError> {
        Ok(SharedOrganizationsPage::empty())
    }

    async fn shared_roles(&self, _query: SharedRolesQuery) -> Result<SharedRolesPage, SourceError> {
        Ok(SharedRolesPage::empty())
    }
}
