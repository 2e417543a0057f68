//! Propagation engine client.
//!
//! HTTP implementation of [`PolicyPropagationPort`] and
//! [`SharedAccessSource`]. Transient failures (connection errors, 5xx and
//! 429) are retried with backoff; any other non-success status is returned
//! as a rejection.

use async_trait::async_trait;
use platform_sharing::{
    GeneralShareUnit, GeneralUnshareUnit, PageRequest, PolicyPropagationPort, PropagationError,
    PropagationResult, SelectiveShareUnit, SelectiveUnshareUnit, SharedAccessSource,
    SharedOrganizationsPage, SharedOrganizationsQuery, SharedRolesPage, SharedRolesQuery,
    SourceError,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::config::EngineConfig;
use crate::retry::{with_retry_if, RetryConfig};

const SHARE_PATH: &str = "/api/v1/user-sharing/share";
const SHARE_WITH_ALL_PATH: &str = "/api/v1/user-sharing/share-with-all";
const UNSHARE_PATH: &str = "/api/v1/user-sharing/unshare";
const UNSHARE_WITH_ALL_PATH: &str = "/api/v1/user-sharing/unshare-with-all";

/// Engine client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Engine returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the engine.
        message: String,
    },

    /// Invalid response from the engine.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,
}

impl ClientError {
    /// Check if the same request could succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::RequestFailed(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ClientError::ApiError { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            ClientError::InvalidResponse(_) | ClientError::AuthenticationFailed => false,
        }
    }
}

impl From<ClientError> for PropagationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidResponse(message) => PropagationError::Internal(message),
            other if other.is_transient() => PropagationError::Unavailable(other.to_string()),
            ClientError::RequestFailed(e) => PropagationError::Internal(e.to_string()),
            other => PropagationError::Rejected(other.to_string()),
        }
    }
}

impl From<ClientError> for SourceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidResponse(message) => SourceError::Internal(message),
            other if other.is_transient() => SourceError::Unavailable(other.to_string()),
            ClientError::RequestFailed(e) => SourceError::Internal(e.to_string()),
            other => SourceError::Rejected(other.to_string()),
        }
    }
}

/// Propagation engine client.
#[derive(Clone)]
pub struct PropagationClient {
    /// HTTP client instance.
    client: Client,

    /// Engine configuration.
    config: EngineConfig,

    /// Backoff policy.
    retry: RetryConfig,
}

impl std::fmt::Debug for PropagationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagationClient")
            .field("base_url", &self.config.endpoint.base_url)
            .field("has_auth", &self.config.endpoint.has_auth())
            .field("retry", &self.retry)
            .finish()
    }
}

impl PropagationClient {
    /// Create a new engine client.
    pub fn new(config: EngineConfig) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let retry = config.retry_config();

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(EngineConfig::from_env())
    }

    /// Override the backoff policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.endpoint.api_key {
            Some(ref api_key) => request.header("Authorization", format!("Bearer {}", api_key)),
            None => request,
        }
    }

    async fn post_unit<B>(&self, path: &str, unit: &B) -> Result<(), ClientError>
    where
        B: Serialize + Sync,
    {
        let url = self.config.endpoint.url(path);
        let url = url.as_str();

        with_retry_if(
            &self.retry,
            || self.send_post(url, unit),
            ClientError::is_transient,
        )
        .await
    }

    async fn send_post<B>(&self, url: &str, unit: &B) -> Result<(), ClientError>
    where
        B: Serialize + Sync,
    {
        let request = self.authorize(self.client.post(url).json(unit));
        let response = request.send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn get_page<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = self.config.endpoint.url(path);
        let url = url.as_str();

        with_retry_if(
            &self.retry,
            || self.send_get(url, query),
            ClientError::is_transient,
        )
        .await
    }

    async fn send_get<T>(&self, url: &str, query: &[(&str, String)]) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let request = self.authorize(self.client.get(url).query(query));
        let response = request.send().await?;
        handle_response(response).await
    }
}

#[async_trait]
impl PolicyPropagationPort for PropagationClient {
    #[instrument(skip(self, unit), fields(user_id = %unit.user_id, org_id = %unit.organization_id))]
    async fn propagate_selective_share(&self, unit: SelectiveShareUnit) -> PropagationResult<()> {
        debug!("Sharing user into organization");
        Ok(self.post_unit(SHARE_PATH, &unit).await?)
    }

    #[instrument(skip(self, unit), fields(user_id = %unit.user_id, policy = unit.sharing_policy.as_str()))]
    async fn propagate_general_share(&self, unit: GeneralShareUnit) -> PropagationResult<()> {
        debug!("Sharing user with all organizations");
        Ok(self.post_unit(SHARE_WITH_ALL_PATH, &unit).await?)
    }

    #[instrument(skip(self, unit), fields(user_id = %unit.user_id, organizations = unit.organization_ids.len()))]
    async fn propagate_selective_unshare(
        &self,
        unit: SelectiveUnshareUnit,
    ) -> PropagationResult<()> {
        debug!("Unsharing user from organizations");
        Ok(self.post_unit(UNSHARE_PATH, &unit).await?)
    }

    #[instrument(skip(self, unit), fields(user_id = %unit.user_id))]
    async fn propagate_general_unshare(&self, unit: GeneralUnshareUnit) -> PropagationResult<()> {
        debug!("Unsharing user from all organizations");
        Ok(self.post_unit(UNSHARE_WITH_ALL_PATH, &unit).await?)
    }
}

#[async_trait]
impl SharedAccessSource for PropagationClient {
    #[instrument(skip(self, query), fields(user_id = %query.user_id))]
    async fn shared_organizations(
        &self,
        query: SharedOrganizationsQuery,
    ) -> Result<SharedOrganizationsPage, SourceError> {
        let path = format!(
            "/api/v1/users/{}/shared-organizations",
            urlencoding::encode(&query.user_id)
        );
        let params = list_params(Vec::new(), &query.page, query.filter, query.recursive);

        Ok(self.get_page(&path, &params).await?)
    }

    #[instrument(skip(self, query), fields(user_id = %query.user_id, org_id = %query.org_id))]
    async fn shared_roles(&self, query: SharedRolesQuery) -> Result<SharedRolesPage, SourceError> {
        let path = format!(
            "/api/v1/users/{}/shared-roles",
            urlencoding::encode(&query.user_id)
        );
        let params = list_params(
            vec![("orgId", query.org_id)],
            &query.page,
            query.filter,
            query.recursive,
        );

        Ok(self.get_page(&path, &params).await?)
    }
}

fn list_params(
    mut params: Vec<(&'static str, String)>,
    page: &PageRequest,
    filter: Option<String>,
    recursive: bool,
) -> Vec<(&'static str, String)> {
    if let Some(ref after) = page.after {
        params.push(("after", after.clone()));
    }
    if let Some(ref before) = page.before {
        params.push(("before", before.clone()));
    }
    if let Some(limit) = page.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(filter) = filter {
        params.push(("filter", filter));
    }
    params.push(("recursive", recursive.to_string()));
    params
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        error!("Propagation engine authentication failed");
        return Err(ClientError::AuthenticationFailed);
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("Propagation engine error ({}): {}", status.as_u16(), message);
        return Err(ClientError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

async fn handle_response<T>(response: reqwest::Response) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
