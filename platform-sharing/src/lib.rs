//! # Platform User Sharing
//!
//! This crate provides organization-hierarchy user sharing for the Relay
//! platform: sharing users from a parent organization into child
//! organizations, unsharing them again, and reading back where a user is
//! shared.
//!
//! ## Overview
//!
//! The platform-sharing crate handles:
//! - **Role Resolution**: Requested role + audience pairs to canonical shared roles
//! - **Orchestration**: Fan-out of share/unshare requests into propagation units
//! - **Outcomes**: Per-unit success/failure aggregated into a batch report
//! - **Queries**: Validated, cursor-paginated listings of shared organizations and roles
//! - **API Surface**: Transport-agnostic request/response handlers
//!
//! ## Architecture
//!
//! ```text
//! UsersApi
//!   ├─ ShareOrchestrator ─→ resolve_roles
//!   │     └─ dispatch (bounded, per-unit timeout) ─→ PolicyPropagationPort
//!   └─ QueryGateway ─→ SharedAccessSource
//! ```
//!
//! The propagation engine and the sharing store are external; they are
//! reached only through the [`PolicyPropagationPort`] and
//! [`SharedAccessSource`] traits. `platform-sharing-client` implements both
//! over HTTP.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use platform_sharing::{
//!     AudienceType, OrganizationShare, PolicyPropagationPort, RoleAudienceSpec,
//!     ShareOrchestrator, UserCriteria,
//! };
//! use std::sync::Arc;
//!
//! async fn share(port: Arc<dyn PolicyPropagationPort>) {
//!     let orchestrator = ShareOrchestrator::new(port);
//!
//!     let users = UserCriteria::new(vec!["u1".to_string()]).unwrap();
//!     let orgs = vec![OrganizationShare::new(
//!         "branch-a",
//!         vec![RoleAudienceSpec::new("editor", "Console", AudienceType::Application)],
//!     )];
//!
//!     let outcome = orchestrator.share_selective(&users, &orgs).await.unwrap();
//!     for failure in outcome.failures() {
//!         println!("{:?} failed: {:?}", failure.key, failure.error());
//!     }
//! }
//! ```
//!
//! ## Failure Semantics
//!
//! - Invalid input is rejected before any unit is dispatched
//! - Every unit is attempted; one failure never stops the rest
//! - Timed-out units are recorded as failed
//! - Retries are left to the port implementation

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod outcome;
pub mod port;
pub mod query;
pub mod roles;

// Re-export main types for convenience
pub use api::{ApiResponse, UsersApi};
pub use config::{ConfigError, SharingConfig};
pub use dispatch::DispatchConfig;
pub use error::{
    ErrorResponse, PropagationError, PropagationResult, SharingError, SharingResult, SourceError,
};
pub use models::{
    Audience, AudienceType, GeneralShareUnit, GeneralUnshareUnit, OrganizationShare, Page,
    RoleAudienceSpec, SelectiveShareUnit, SelectiveUnshareUnit, SharedOrganization,
    SharedOrganizationsPage, SharedRole, SharedRolesPage, SharedType, SharingPolicy,
    UserCriteria,
};
pub use orchestrator::ShareOrchestrator;
pub use outcome::{
    BatchOutcome, BatchReport, BatchStatus, SharingOperation, UnitFailure, UnitKey, UnitResult,
    UnitStatus,
};
pub use port::{
    PageRequest, PolicyPropagationPort, SharedAccessSource, SharedOrganizationsQuery,
    SharedRolesQuery, UnconnectedSource,
};
pub use query::{ListParams, QueryGateway};
pub use roles::resolve_roles;
