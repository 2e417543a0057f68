//! Shared test doubles for the propagation engine.

#![allow(dead_code)]

use async_trait::async_trait;
use platform_sharing::{
    GeneralShareUnit, GeneralUnshareUnit, PolicyPropagationPort, PropagationError,
    PropagationResult, SelectiveShareUnit, SelectiveUnshareUnit,
};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

/// A call received by [`RecordingPort`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SelectiveShare(SelectiveShareUnit),
    GeneralShare(GeneralShareUnit),
    SelectiveUnshare(SelectiveUnshareUnit),
    GeneralUnshare(GeneralUnshareUnit),
}

/// Port that records every unit and fails or stalls on request.
///
/// Failures are keyed by `user_id` or `user_id/org_id`.
#[derive(Default)]
pub struct RecordingPort {
    calls: Mutex<Vec<Call>>,
    failing: HashSet<String>,
    stalling: HashSet<String>,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject units for this user (any org) or `user/org` pair.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Never complete units for this user or `user/org` pair.
    pub fn stalling(mut self, key: &str) -> Self {
        self.stalling.insert(key.to_string());
        self
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: Call, user_id: &str, org_id: Option<&str>) -> PropagationResult<()> {
        self.calls.lock().await.push(call);

        let pair = org_id.map(|org| format!("{}/{}", user_id, org));
        let matches = |set: &HashSet<String>| {
            set.contains(user_id) || pair.as_ref().map_or(false, |p| set.contains(p))
        };

        if matches(&self.stalling) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if matches(&self.failing) {
            return Err(PropagationError::Rejected(format!("user {} rejected", user_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl PolicyPropagationPort for RecordingPort {
    async fn propagate_selective_share(&self, unit: SelectiveShareUnit) -> PropagationResult<()> {
        let (user, org) = (unit.user_id.clone(), unit.organization_id.clone());
        self.record(Call::SelectiveShare(unit), &user, Some(&org)).await
    }

    async fn propagate_general_share(&self, unit: GeneralShareUnit) -> PropagationResult<()> {
        let user = unit.user_id.clone();
        self.record(Call::GeneralShare(unit), &user, None).await
    }

    async fn propagate_selective_unshare(
        &self,
        unit: SelectiveUnshareUnit,
    ) -> PropagationResult<()> {
        let user = unit.user_id.clone();
        self.record(Call::SelectiveUnshare(unit), &user, None).await
    }

    async fn propagate_general_unshare(&self, unit: GeneralUnshareUnit) -> PropagationResult<()> {
        let user = unit.user_id.clone();
        self.record(Call::GeneralUnshare(unit), &user, None).await
    }
}

pub fn users(ids: &[&str]) -> platform_sharing::UserCriteria {
    platform_sharing::UserCriteria::new(ids.iter().map(|s| s.to_string()).collect())
        .expect("valid user criteria")
}
