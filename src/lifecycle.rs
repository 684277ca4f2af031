//! Run lifecycle: before/after snapshots and state reconciliation
//!
//! Brackets the whole run. A snapshot that cannot be read is "unavailable"
//! and logged, never fatal; without an initial snapshot no delta is reported.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::client::AccountClient;
use crate::config::RunConfig;
use crate::models::AccountSnapshot;

/// Observed change between the initial and final snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDelta {
    pub balance_delta: Decimal,
    /// Expected >= 0; each committed write bumps the version token
    pub version_delta: i64,
}

impl SnapshotDelta {
    pub fn between(initial: &AccountSnapshot, last: &AccountSnapshot) -> Self {
        Self {
            balance_delta: last.balance - initial.balance,
            version_delta: last.version - initial.version,
        }
    }
}

pub struct LifecycleCoordinator<'a> {
    config: &'a RunConfig,
    client: &'a AccountClient,
}

impl<'a> LifecycleCoordinator<'a> {
    pub fn new(config: &'a RunConfig, client: &'a AccountClient) -> Self {
        Self { config, client }
    }

    /// Read account state; a failed read degrades to None
    pub async fn capture_snapshot(&self) -> Option<AccountSnapshot> {
        match self.client.fetch_account().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("account snapshot unavailable: {e}");
                None
            }
        }
    }

    /// Log the run banner and the initial state, return it as run context
    pub async fn before_run(&self) -> Option<AccountSnapshot> {
        info!("account load harness starting at {}", Utc::now().to_rfc3339());
        info!("  target base URL: {}", self.config.base_url);
        info!("  account id     : {}", self.config.account_id);
        info!("  locking mode   : {}", self.config.mode);
        info!(
            "  actors/budget  : {} actors, {} iterations, cap {:?}",
            self.config.actors, self.config.iterations, self.config.max_duration
        );

        let initial = self.capture_snapshot().await;
        if let Some(ref snapshot) = initial {
            info!(
                "initial state: balance {} {} | version {} | owner {}",
                snapshot.balance, snapshot.currency, snapshot.version, snapshot.owner_name
            );
        }
        initial
    }

    /// Capture the final state and report deltas when both snapshots exist
    pub async fn after_run(&self, initial: Option<&AccountSnapshot>) -> Option<SnapshotDelta> {
        let last = self.capture_snapshot().await?;
        info!(
            "final state: balance {} {} | version {} | owner {}",
            last.balance, last.currency, last.version, last.owner_name
        );

        let initial = initial?;
        let delta = SnapshotDelta::between(initial, &last);
        info!(
            "changes: balance {}{} {} | version +{}",
            if delta.balance_delta.is_sign_negative() { "" } else { "+" },
            delta.balance_delta,
            last.currency,
            delta.version_delta
        );
        Some(delta)
    }
}
