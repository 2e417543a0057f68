//! Users API surface
//!
//! Transport-agnostic request handlers for the user sharing endpoints. A web
//! layer deserializes the request bodies defined here, calls [`UsersApi`],
//! and writes back the returned [`ApiResponse`] status and JSON body.
//!
//! | Handler | Success |
//! |---------|---------|
//! | `process_user_sharing` | 204, or 207 with a batch report |
//! | `process_user_sharing_all` | 204, or 207 with a batch report |
//! | `process_user_unsharing` | 204, or 207 with a batch report |
//! | `remove_user_sharing` | 204, or 207 with a batch report |
//! | `get_shared_organizations` | 200 with [`UserSharedOrganizationsResponse`] |
//! | `get_shared_roles` | 200 with [`UserSharedRolesResponse`] |
//!
//! Invalid input answers 400; a batch in which every unit failed, or a
//! failed query, answers 500.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::config::{ConfigError, SharingConfig};
use crate::error::{ErrorResponse, SharingError, SharingResult};
use crate::models::{
    OrganizationShare, RoleAudienceSpec, SharedOrganization, SharedType, SharingPolicy,
    UserCriteria,
};
use crate::orchestrator::ShareOrchestrator;
use crate::outcome::{BatchOutcome, BatchReport, BatchStatus};
use crate::port::{PolicyPropagationPort, SharedAccessSource};
use crate::query::{ListParams, QueryGateway};

/// `userCriteria` object of every share/unshare body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserCriteriaBody {
    /// Users to act on
    #[serde(default)]
    pub user_ids: Vec<String>,
}

impl UserCriteriaBody {
    /// Creates criteria from user ids.
    pub fn new<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_ids: user_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Share users into specific organizations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserShareRequestBody {
    /// Users to share
    #[serde(default)]
    pub user_criteria: Option<UserCriteriaBody>,

    /// Target organizations with their roles
    #[serde(default)]
    pub organizations: Vec<OrganizationShare>,
}

/// Share users into all organizations under a policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserShareWithAllRequestBody {
    /// Users to share
    #[serde(default)]
    pub user_criteria: Option<UserCriteriaBody>,

    /// Scope of the share
    pub policy: SharingPolicy,

    /// Roles assigned in every reached organization
    #[serde(default)]
    pub roles: Vec<RoleAudienceSpec>,
}

/// Unshare users from specific organizations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserUnshareRequestBody {
    /// Users to unshare
    #[serde(default)]
    pub user_criteria: Option<UserCriteriaBody>,

    /// Organization ids to remove the users from
    #[serde(default)]
    pub organizations: Vec<String>,
}

/// Unshare users from every organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserUnshareWithAllRequestBody {
    /// Users to unshare
    #[serde(default)]
    pub user_criteria: Option<UserCriteriaBody>,
}

/// Pagination link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    /// Target URL (path and query)
    pub href: String,

    /// `next` or `previous`
    pub rel: String,
}

/// Organization entry of a shared-organizations listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SharedOrganizationEntry {
    /// Organization ID
    pub org_id: String,

    /// Organization display name
    pub org_name: String,

    /// ID of the shared user inside that organization
    pub shared_user_id: String,

    /// Direct or inherited
    pub shared_type: SharedType,

    /// Link to the user's roles in that organization
    pub roles_ref: String,
}

/// Body of a shared-organizations listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSharedOrganizationsResponse {
    /// Pagination links
    pub links: Vec<Link>,

    /// Organizations on this page
    pub shared_organizations: Vec<SharedOrganizationEntry>,
}

/// Body of a shared-roles listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSharedRolesResponse {
    /// Pagination links
    pub links: Vec<Link>,

    /// Roles on this page
    pub roles: Vec<RoleAudienceSpec>,
}

/// Body returned when every unit of a batch failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchErrorResponse {
    /// Error summary
    #[serde(flatten)]
    pub error: ErrorResponse,

    /// Per-unit detail
    pub batch: BatchReport,
}

/// Status code and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,

    /// JSON body, if any
    pub body: Option<serde_json::Value>,
}

impl ApiResponse {
    /// 204 with no body.
    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    /// Any status with a JSON body.
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self {
                status,
                body: Some(value),
            },
            Err(e) => {
                error!(error = %e, "Failed to serialize response body");
                Self {
                    status: 500,
                    body: None,
                }
            }
        }
    }

    /// Error response for a sharing error.
    pub fn error(err: &SharingError) -> Self {
        Self::json(err.status_code(), &err.to_response())
    }
}

/// Request handlers for the user sharing endpoints.
///
/// # Examples
///
/// ```rust,no_run
/// use platform_sharing::api::{UserCriteriaBody, UserUnshareWithAllRequestBody, UsersApi};
/// use platform_sharing::{PolicyPropagationPort, QueryGateway, ShareOrchestrator};
/// use std::sync::Arc;
///
/// async fn handle(port: Arc<dyn PolicyPropagationPort>) {
///     let api = UsersApi::new(ShareOrchestrator::new(port), QueryGateway::unconnected());
///
///     let response = api
///         .remove_user_sharing(UserUnshareWithAllRequestBody {
///             user_criteria: Some(UserCriteriaBody::new(["u1"])),
///         })
///         .await;
///     assert_eq!(response.status, 204);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct UsersApi {
    /// Share/unshare fan-out
    orchestrator: ShareOrchestrator,

    /// Listing validation and forwarding
    gateway: QueryGateway,

    /// Prefix for generated links
    base_path: String,
}

impl UsersApi {
    /// Create handlers with the default link prefix.
    pub fn new(orchestrator: ShareOrchestrator, gateway: QueryGateway) -> Self {
        Self {
            orchestrator,
            gateway,
            base_path: SharingConfig::default().api_base_path,
        }
    }

    /// Wire handlers from configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if `config` fails validation.
    pub fn from_config(
        port: Arc<dyn PolicyPropagationPort>,
        source: Arc<dyn SharedAccessSource>,
        config: &SharingConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            orchestrator: ShareOrchestrator::from_config(port, config)?,
            gateway: QueryGateway::from_config(source, config),
            base_path: config.api_base_path.clone(),
        })
    }

    /// Share users into specific organizations.
    pub async fn process_user_sharing(&self, body: UserShareRequestBody) -> ApiResponse {
        let users = match user_criteria(body.user_criteria) {
            Ok(users) => users,
            Err(err) => return ApiResponse::error(&err),
        };
        batch_response(
            self.orchestrator
                .share_selective(&users, &body.organizations)
                .await,
        )
    }

    /// Share users into all organizations under a policy.
    pub async fn process_user_sharing_all(&self, body: UserShareWithAllRequestBody) -> ApiResponse {
        let users = match user_criteria(body.user_criteria) {
            Ok(users) => users,
            Err(err) => return ApiResponse::error(&err),
        };
        batch_response(
            self.orchestrator
                .share_with_all(&users, body.policy, &body.roles)
                .await,
        )
    }

    /// Unshare users from specific organizations.
    pub async fn process_user_unsharing(&self, body: UserUnshareRequestBody) -> ApiResponse {
        let users = match user_criteria(body.user_criteria) {
            Ok(users) => users,
            Err(err) => return ApiResponse::error(&err),
        };
        batch_response(
            self.orchestrator
                .unshare_selective(&users, &body.organizations)
                .await,
        )
    }

    /// Unshare users from every organization.
    pub async fn remove_user_sharing(&self, body: UserUnshareWithAllRequestBody) -> ApiResponse {
        let users = match user_criteria(body.user_criteria) {
            Ok(users) => users,
            Err(err) => return ApiResponse::error(&err),
        };
        batch_response(self.orchestrator.unshare_with_all(&users).await)
    }

    /// List organizations a user is shared into.
    pub async fn get_shared_organizations(&self, user_id: &str, params: ListParams) -> ApiResponse {
        let link_params = params.clone();

        match self
            .gateway
            .list_shared_organizations(user_id, params)
            .await
        {
            Ok(page) => {
                let path = format!(
                    "{}/users/{}/shared-organizations",
                    self.base_path,
                    urlencoding::encode(user_id)
                );
                let response = UserSharedOrganizationsResponse {
                    links: page_links(
                        &path,
                        &[],
                        &link_params,
                        page.next_cursor.as_deref(),
                        page.previous_cursor.as_deref(),
                    ),
                    shared_organizations: page
                        .items
                        .into_iter()
                        .map(|org| self.organization_entry(user_id, org))
                        .collect(),
                };
                ApiResponse::json(200, &response)
            }
            Err(err) => ApiResponse::error(&err),
        }
    }

    /// List roles a user holds in an organization.
    pub async fn get_shared_roles(
        &self,
        user_id: &str,
        org_id: &str,
        params: ListParams,
    ) -> ApiResponse {
        let link_params = params.clone();

        match self.gateway.list_shared_roles(user_id, org_id, params).await {
            Ok(page) => {
                let path = format!(
                    "{}/users/{}/shared-roles",
                    self.base_path,
                    urlencoding::encode(user_id)
                );
                let response = UserSharedRolesResponse {
                    links: page_links(
                        &path,
                        &[("orgId", org_id)],
                        &link_params,
                        page.next_cursor.as_deref(),
                        page.previous_cursor.as_deref(),
                    ),
                    roles: page.items.into_iter().map(RoleAudienceSpec::from).collect(),
                };
                ApiResponse::json(200, &response)
            }
            Err(err) => ApiResponse::error(&err),
        }
    }

    fn organization_entry(&self, user_id: &str, org: SharedOrganization) -> SharedOrganizationEntry {
        let roles_ref = format!(
            "{}/users/{}/shared-roles?orgId={}",
            self.base_path,
            urlencoding::encode(user_id),
            urlencoding::encode(&org.org_id)
        );

        SharedOrganizationEntry {
            org_id: org.org_id,
            org_name: org.org_name,
            shared_user_id: org.shared_user_id,
            shared_type: org.shared_type,
            roles_ref,
        }
    }
}

fn user_criteria(body: Option<UserCriteriaBody>) -> SharingResult<UserCriteria> {
    let body = body.ok_or(SharingError::MissingUserCriteria)?;
    UserCriteria::new(body.user_ids)
}

fn batch_response(result: SharingResult<BatchOutcome>) -> ApiResponse {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => return ApiResponse::error(&err),
    };

    match outcome.status() {
        BatchStatus::Succeeded => ApiResponse::no_content(),
        BatchStatus::PartiallyFailed => ApiResponse::json(207, &outcome.report()),
        BatchStatus::Failed => {
            let err = SharingError::PropagationFailed {
                failed: outcome.failed_count(),
            };
            ApiResponse::json(
                err.status_code(),
                &BatchErrorResponse {
                    error: err.to_response(),
                    batch: outcome.report(),
                },
            )
        }
    }
}

/// Build `next`/`previous` links, carrying the caller's limit, filter and
/// recursive flag over to the linked page.
fn page_links(
    path: &str,
    fixed: &[(&str, &str)],
    params: &ListParams,
    next: Option<&str>,
    previous: Option<&str>,
) -> Vec<Link> {
    let mut links = Vec::new();
    if let Some(cursor) = next {
        links.push(Link {
            href: link_href(path, fixed, params, ("after", cursor)),
            rel: "next".to_string(),
        });
    }
    if let Some(cursor) = previous {
        links.push(Link {
            href: link_href(path, fixed, params, ("before", cursor)),
            rel: "previous".to_string(),
        });
    }
    links
}

fn link_href(
    path: &str,
    fixed: &[(&str, &str)],
    params: &ListParams,
    cursor: (&str, &str),
) -> String {
    let mut query: Vec<(String, String)> = fixed
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    query.push((cursor.0.to_string(), cursor.1.to_string()));
    if let Some(limit) = params.limit {
        query.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(ref filter) = params.filter {
        query.push(("filter".to_string(), filter.clone()));
    }
    if let Some(recursive) = params.recursive {
        query.push(("recursive".to_string(), recursive.to_string()));
    }

    let query = query
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", path, query)
}
