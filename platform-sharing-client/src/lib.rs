//! # Platform Sharing Client
//!
//! HTTP client for the propagation engine behind Relay user sharing.
//!
//! [`PropagationClient`] implements both ports of `platform-sharing`:
//!
//! - [`PolicyPropagationPort`](platform_sharing::PolicyPropagationPort):
//!   `POST /api/v1/user-sharing/{share,share-with-all,unshare,unshare-with-all}`
//! - [`SharedAccessSource`](platform_sharing::SharedAccessSource):
//!   `GET /api/v1/users/{userId}/shared-organizations` and
//!   `GET /api/v1/users/{userId}/shared-roles?orgId=`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use platform_sharing::{SharingConfig, UsersApi};
//! use platform_sharing_client::PropagationClient;
//! use std::sync::Arc;
//!
//! fn wire() -> Result<UsersApi, Box<dyn std::error::Error>> {
//!     let client = Arc::new(PropagationClient::from_env()?);
//!     let api = UsersApi::from_config(client.clone(), client, &SharingConfig::from_env()?)?;
//!     Ok(api)
//! }
//! ```

pub mod client;
pub mod config;
pub mod retry;

pub use client::{ClientError, PropagationClient};
pub use config::{ConfigError, EngineConfig, EngineEndpoint};
pub use retry::RetryConfig;
