//! Sharing domain models
//!
//! This module provides the request-scoped entities that flow through the
//! orchestrator: user criteria, requested roles, resolved shared roles, the
//! four propagation units, and the paginated read models.

use serde::{Deserialize, Serialize};

use crate::error::{SharingError, SharingResult};

/// Ordered, non-empty list of user ids to share or unshare.
///
/// Order is preserved and duplicates are kept; each entry produces its own
/// propagation units.
///
/// # Examples
///
/// ```
/// use platform_sharing::UserCriteria;
///
/// let criteria = UserCriteria::new(vec!["u1".to_string(), "u2".to_string()]).unwrap();
/// assert_eq!(criteria.len(), 2);
///
/// assert!(UserCriteria::new(vec![]).is_err());
/// assert!(UserCriteria::new(vec!["  ".to_string()]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCriteria {
    user_ids: Vec<String>,
}

impl UserCriteria {
    /// Creates validated user criteria.
    ///
    /// # Errors
    ///
    /// - [`SharingError::MissingUserCriteria`] if `user_ids` is empty
    /// - [`SharingError::BlankUserId`] for the first blank entry
    pub fn new(user_ids: Vec<String>) -> SharingResult<Self> {
        if user_ids.is_empty() {
            return Err(SharingError::MissingUserCriteria);
        }
        if let Some(blank) = user_ids.iter().find(|id| id.trim().is_empty()) {
            return Err(SharingError::BlankUserId(blank.clone()));
        }
        Ok(Self { user_ids })
    }

    /// User ids in request order.
    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    /// Number of user ids.
    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    /// Always `false` for validated criteria.
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
}

/// Kind of audience a role is defined against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AudienceType {
    /// Role defined by an organization
    Organization,

    /// Role defined by an application
    Application,
}

impl AudienceType {
    /// Get string representation of the audience type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Application => "application",
        }
    }
}

/// Audience of a requested role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Audience {
    /// Audience display name
    pub display: String,

    /// Audience type
    #[serde(rename = "type")]
    pub audience_type: AudienceType,
}

impl Audience {
    /// Creates a new audience.
    pub fn new(display: impl Into<String>, audience_type: AudienceType) -> Self {
        Self {
            display: display.into(),
            audience_type,
        }
    }
}

/// A role as requested by the caller, scoped to an audience.
///
/// The audience is optional on the wire so that a missing audience reaches
/// the role resolver and is reported as an invalid role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleAudienceSpec {
    /// Role display name
    pub display_name: String,

    /// Audience the role belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
}

impl RoleAudienceSpec {
    /// Creates a role spec with an audience.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_sharing::{AudienceType, RoleAudienceSpec};
    ///
    /// let role = RoleAudienceSpec::new("editor", "Console", AudienceType::Application);
    /// assert_eq!(role.audience.unwrap().display, "Console");
    /// ```
    pub fn new(
        display_name: impl Into<String>,
        audience_display: impl Into<String>,
        audience_type: AudienceType,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            audience: Some(Audience::new(audience_display, audience_type)),
        }
    }
}

/// Canonical shared role produced by the role resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SharedRole {
    /// Role name
    pub role_name: String,

    /// Audience display name
    pub audience_name: String,

    /// Audience type
    pub audience_type: AudienceType,
}

impl From<SharedRole> for RoleAudienceSpec {
    fn from(role: SharedRole) -> Self {
        Self {
            display_name: role.role_name,
            audience: Some(Audience::new(role.audience_name, role.audience_type)),
        }
    }
}

/// Scope of a general ("with all") share.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SharingPolicy {
    /// Every organization that exists now, at any depth
    #[serde(rename = "ALL_EXISTING_ORGS_ONLY", alias = "ALL_EXISTING_ORGS")]
    AllExistingOrgsOnly,

    /// Every organization now and any created later, at any depth
    #[serde(rename = "ALL_EXISTING_AND_FUTURE_ORGS")]
    AllExistingAndFutureOrgs,

    /// Direct child organizations that exist now
    #[serde(rename = "IMMEDIATE_EXISTING_ORGS_ONLY")]
    ImmediateExistingOrgsOnly,

    /// Direct child organizations now and any created later
    #[serde(rename = "IMMEDIATE_EXISTING_AND_FUTURE_ORGS")]
    ImmediateExistingAndFutureOrgs,
}

impl SharingPolicy {
    /// Get the wire value of the policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_sharing::SharingPolicy;
    ///
    /// assert_eq!(
    ///     SharingPolicy::AllExistingAndFutureOrgs.as_str(),
    ///     "ALL_EXISTING_AND_FUTURE_ORGS"
    /// );
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllExistingOrgsOnly => "ALL_EXISTING_ORGS_ONLY",
            Self::AllExistingAndFutureOrgs => "ALL_EXISTING_AND_FUTURE_ORGS",
            Self::ImmediateExistingOrgsOnly => "IMMEDIATE_EXISTING_ORGS_ONLY",
            Self::ImmediateExistingAndFutureOrgs => "IMMEDIATE_EXISTING_AND_FUTURE_ORGS",
        }
    }

    /// Check if the share extends to organizations created later.
    pub fn includes_future_orgs(&self) -> bool {
        matches!(
            self,
            Self::AllExistingAndFutureOrgs | Self::ImmediateExistingAndFutureOrgs
        )
    }
}

/// One organization entry of a selective share request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationShare {
    /// Target organization
    pub org_id: String,

    /// Roles to assign in that organization (may be empty)
    #[serde(default)]
    pub roles: Vec<RoleAudienceSpec>,
}

impl OrganizationShare {
    /// Creates an organization entry.
    pub fn new(org_id: impl Into<String>, roles: Vec<RoleAudienceSpec>) -> Self {
        Self {
            org_id: org_id.into(),
            roles,
        }
    }
}

/// Share one user into one organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectiveShareUnit {
    /// User being shared
    pub user_id: String,

    /// Target organization
    pub organization_id: String,

    /// Roles to assign; empty means access without role assignment
    pub roles: Vec<SharedRole>,
}

/// Share one user into all organizations under a policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralShareUnit {
    /// User being shared
    pub user_id: String,

    /// Scope of the share
    pub sharing_policy: SharingPolicy,

    /// Roles to assign in every reached organization
    pub roles: Vec<SharedRole>,
}

/// Unshare one user from a set of organizations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectiveUnshareUnit {
    /// User being unshared
    pub user_id: String,

    /// Organizations to remove the user from
    pub organization_ids: Vec<String>,
}

/// Unshare one user from every organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralUnshareUnit {
    /// User being unshared
    pub user_id: String,
}

/// How a user came to be shared into an organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharedType {
    /// Shared into the organization itself
    Direct,

    /// Reached through an ancestor organization
    Inherited,
}

/// An organization a user is shared into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SharedOrganization {
    /// Organization ID
    pub org_id: String,

    /// Organization display name
    pub org_name: String,

    /// ID of the shared user inside that organization
    pub shared_user_id: String,

    /// Direct or inherited
    pub shared_type: SharedType,
}

/// One page of a cursor-paginated listing.
///
/// Cursors are opaque and produced by the downstream store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in store order
    pub items: Vec<T>,

    /// Cursor for the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,

    /// Cursor for the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A page with no items and no cursors.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            previous_cursor: None,
        }
    }

    /// Check if the page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Page of organizations a user is shared into.
pub type SharedOrganizationsPage = Page<SharedOrganization>;

/// Page of roles a user holds in an organization.
pub type SharedRolesPage = Page<SharedRole>;
