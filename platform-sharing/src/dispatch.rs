//! Bounded unit dispatch
//!
//! Runs propagation calls with a cap on how many are in flight, a deadline
//! per call, and results collected in input order. A failing or timed-out
//! unit never stops the others.

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SharingConfig;
use crate::error::{PropagationError, PropagationResult};
use crate::outcome::{UnitKey, UnitResult, UnitStatus};

/// Scheduling limits for unit dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum units in flight; values below 1 are treated as 1
    pub max_concurrency: usize,

    /// Deadline for each unit's call
    pub unit_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from(&SharingConfig::default())
    }
}

impl From<&SharingConfig> for DispatchConfig {
    fn from(config: &SharingConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            unit_timeout: config.unit_timeout(),
        }
    }
}

impl DispatchConfig {
    /// One unit at a time.
    pub fn sequential() -> Self {
        Self {
            max_concurrency: 1,
            ..Self::default()
        }
    }
}

/// Dispatch every unit through `call` and collect one result per unit.
pub(crate) async fn dispatch_units<U, F, Fut>(
    units: Vec<(UnitKey, U)>,
    config: DispatchConfig,
    call: F,
) -> Vec<UnitResult>
where
    F: Fn(U) -> Fut,
    Fut: Future<Output = PropagationResult<()>>,
{
    let window = config.max_concurrency.max(1);
    let timeout_ms = u64::try_from(config.unit_timeout.as_millis()).unwrap_or(u64::MAX);

    stream::iter(units)
        .map(|(key, unit)| {
            debug!(
                operation = %key.operation,
                user_id = %key.user_id,
                organization_id = ?key.organization_id,
                "Dispatching propagation unit"
            );
            let pending = tokio::time::timeout(config.unit_timeout, call(unit));

            async move {
                let status = match pending.await {
                    Ok(Ok(())) => UnitStatus::Succeeded,
                    Ok(Err(err)) => UnitStatus::Failed(err),
                    Err(_) => UnitStatus::Failed(PropagationError::Timeout(timeout_ms)),
                };

                if let UnitStatus::Failed(ref err) = status {
                    warn!(
                        operation = %key.operation,
                        user_id = %key.user_id,
                        organization_id = ?key.organization_id,
                        error = %err,
                        transient = err.is_transient(),
                        "Propagation unit failed"
                    );
                }

                UnitResult { key, status }
            }
        })
        .buffered(window)
        .collect()
        .await
}
