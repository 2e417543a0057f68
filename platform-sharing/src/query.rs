//! Shared-access queries
//!
//! The query gateway validates listing requests and forwards them to a
//! [`SharedAccessSource`]. All validation happens before the source is
//! called; `filter` is passed through untouched.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::SharingConfig;
use crate::error::{SharingError, SharingResult};
use crate::models::{SharedOrganizationsPage, SharedRolesPage};
use crate::port::{
    PageRequest, SharedAccessSource, SharedOrganizationsQuery, SharedRolesQuery,
    UnconnectedSource,
};

/// Raw listing parameters as received from the caller.
///
/// `offset`, `sort_order` and `sort_by` exist only so they can be rejected
/// explicitly; listings are cursor-paginated and unsorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Return items after this cursor
    pub after: Option<String>,

    /// Return items before this cursor
    pub before: Option<String>,

    /// Maximum number of items
    pub limit: Option<i64>,

    /// Not supported
    pub offset: Option<i64>,

    /// Not supported
    pub sort_order: Option<String>,

    /// Not supported
    pub sort_by: Option<String>,

    /// Opaque filter expression
    pub filter: Option<String>,

    /// Include entries reached through the hierarchy
    pub recursive: Option<bool>,
}

impl ListParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `after` cursor.
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Set the `before` cursor.
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    /// Set the page size.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set an offset (always rejected).
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set a sort order (always rejected).
    pub fn sort_order(mut self, order: impl Into<String>) -> Self {
        self.sort_order = Some(order.into());
        self
    }

    /// Set a sort attribute (always rejected).
    pub fn sort_by(mut self, attribute: impl Into<String>) -> Self {
        self.sort_by = Some(attribute.into());
        self
    }

    /// Set the filter expression.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set recursive listing.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }
}

/// Parameters that survived validation.
struct Validated {
    page: PageRequest,
    filter: Option<String>,
    recursive: bool,
}

/// Validates and forwards shared-access listings.
///
/// # Examples
///
/// ```rust,no_run
/// use platform_sharing::{ListParams, QueryGateway};
///
/// async fn list() {
///     let gateway = QueryGateway::unconnected();
///     let page = gateway
///         .list_shared_organizations("u1", ListParams::new().limit(10).recursive(true))
///         .await
///         .unwrap();
///     assert!(page.is_empty());
/// }
/// ```
#[derive(Clone)]
pub struct QueryGateway {
    /// Downstream store
    source: Arc<dyn SharedAccessSource>,

    /// Whether `limit` is accepted
    limit_supported: bool,
}

impl std::fmt::Debug for QueryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryGateway")
            .field("limit_supported", &self.limit_supported)
            .finish()
    }
}

impl QueryGateway {
    /// Create a gateway over a source; `limit` is accepted.
    pub fn new(source: Arc<dyn SharedAccessSource>) -> Self {
        Self {
            source,
            limit_supported: true,
        }
    }

    /// Create a gateway from sharing configuration.
    pub fn from_config(source: Arc<dyn SharedAccessSource>, config: &SharingConfig) -> Self {
        Self::new(source).with_limit_supported(config.limit_supported)
    }

    /// Create a gateway with no store behind it; every page is empty.
    pub fn unconnected() -> Self {
        Self::new(Arc::new(UnconnectedSource))
    }

    /// Accept or reject the `limit` parameter.
    pub fn with_limit_supported(mut self, supported: bool) -> Self {
        self.limit_supported = supported;
        self
    }

    /// List organizations a user is shared into.
    ///
    /// # Errors
    ///
    /// Any invalid-input [`SharingError`] from validation, or
    /// [`SharingError::QueryFailed`] if the source fails.
    #[instrument(skip(self, params), fields(user_id = %user_id))]
    pub async fn list_shared_organizations(
        &self,
        user_id: &str,
        params: ListParams,
    ) -> SharingResult<SharedOrganizationsPage> {
        ensure_user_id(user_id)?;
        let valid = self.validate(params)?;

        debug!(recursive = valid.recursive, "Listing shared organizations");

        let page = self
            .source
            .shared_organizations(SharedOrganizationsQuery {
                user_id: user_id.to_string(),
                page: valid.page,
                filter: valid.filter,
                recursive: valid.recursive,
            })
            .await?;

        Ok(page)
    }

    /// List roles a user holds in an organization.
    ///
    /// # Errors
    ///
    /// Any invalid-input [`SharingError`] from validation, or
    /// [`SharingError::QueryFailed`] if the source fails.
    #[instrument(skip(self, params), fields(user_id = %user_id, org_id = %org_id))]
    pub async fn list_shared_roles(
        &self,
        user_id: &str,
        org_id: &str,
        params: ListParams,
    ) -> SharingResult<SharedRolesPage> {
        ensure_user_id(user_id)?;
        if org_id.trim().is_empty() {
            return Err(SharingError::BlankOrganizationId(org_id.to_string()));
        }
        let valid = self.validate(params)?;

        debug!(recursive = valid.recursive, "Listing shared roles");

        let page = self
            .source
            .shared_roles(SharedRolesQuery {
                user_id: user_id.to_string(),
                org_id: org_id.to_string(),
                page: valid.page,
                filter: valid.filter,
                recursive: valid.recursive,
            })
            .await?;

        Ok(page)
    }

    fn validate(&self, params: ListParams) -> SharingResult<Validated> {
        if let Some(limit) = params.limit {
            if !self.limit_supported {
                return Err(SharingError::UnsupportedLimit(limit));
            }
        }
        if let Some(offset) = params.offset {
            return Err(SharingError::UnsupportedOffset(offset));
        }
        if let Some(order) = params.sort_order {
            return Err(SharingError::UnsupportedSortOrder(order));
        }
        if let Some(by) = params.sort_by {
            return Err(SharingError::UnsupportedSortBy(by));
        }

        if params.after.is_some() && params.before.is_some() {
            return Err(SharingError::ConflictingCursors);
        }

        let limit = params
            .limit
            .map(|limit| {
                u32::try_from(limit)
                    .ok()
                    .filter(|l| *l > 0)
                    .ok_or(SharingError::InvalidLimit(limit))
            })
            .transpose()?;

        Ok(Validated {
            page: PageRequest {
                after: params.after,
                before: params.before,
                limit,
            },
            filter: params.filter,
            recursive: params.recursive.unwrap_or(false),
        })
    }
}

fn ensure_user_id(user_id: &str) -> SharingResult<()> {
    if user_id.trim().is_empty() {
        return Err(SharingError::BlankUserId(user_id.to_string()));
    }
    Ok(())
}
