//! lockbench - entry point
//!
//! Resolution order:
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌───────────┐    ┌──────────┐
//! │  Config  │───▶│ beforeRun │───▶│ Scheduler │───▶│ afterRun │
//! │  (env)   │    │ (snapshot)│    │ (actors)  │    │ (deltas) │
//! └──────────┘    └───────────┘    └───────────┘    └──────────┘
//!                                                        │
//!                                              threshold verdict
//! ```
//!
//! Exit code: 0 on pass, 1 on threshold breach, 2 on startup failure.

use std::process::ExitCode;
use std::sync::Arc;

use lockbench::client::AccountClient;
use lockbench::config::RunConfig;
use lockbench::lifecycle::LifecycleCoordinator;
use lockbench::logging::{LogConfig, init_logging};
use lockbench::metrics::{RunMetrics, Thresholds};
use lockbench::scheduler::{Scheduler, ThinkTime};

#[tokio::main]
async fn main() -> ExitCode {
    // Config is resolved and validated before anything else; a bad config
    // means zero HTTP calls are made.
    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("startup failure: {e}");
            eprintln!("usage: ACCOUNT_ID=<id> [BASE_URL=..] [MODE=OPTIMISTIC|PESSIMISTIC] lockbench");
            return ExitCode::from(2);
        }
    };

    let _log_guard = init_logging(&LogConfig::default());

    let client = match AccountClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("startup failure: {e}");
            return ExitCode::from(2);
        }
    };

    let initial = {
        let lifecycle = LifecycleCoordinator::new(&config, &client);
        lifecycle.before_run().await
    };

    let config = Arc::new(config);
    let client = Arc::new(client);
    let metrics = Arc::new(RunMetrics::new());
    let scheduler = Scheduler::new(
        Arc::clone(&config),
        Arc::clone(&client),
        Arc::clone(&metrics),
        ThinkTime::default(),
    );

    let report = scheduler.run().await;

    let lifecycle = LifecycleCoordinator::new(&config, &client);
    lifecycle.after_run(initial.as_ref()).await;

    let snapshot = metrics.snapshot();
    let verdict = Thresholds::default().evaluate(&snapshot);

    tracing::info!(
        "iterations: {}/{} completed{} | deposits {} | withdrawals {}",
        report.completed,
        report.requested,
        if report.partial { " (partial)" } else { "" },
        snapshot.deposits,
        snapshot.withdrawals,
    );
    tracing::info!(
        "outcomes: {} success | {} conflict | {} validation | {} other",
        snapshot.successes,
        snapshot.conflicts,
        snapshot.validation_errors,
        snapshot.other_errors,
    );
    if let Some((min, max, last)) = snapshot.balance_summary() {
        tracing::info!("balance trend: min {min} | max {max} | last {last}");
    }
    tracing::info!(
        "thresholds: p95 {} ms [{}] | failure rate {:.1}% [{}] | conflict rate {:.1}% [{}]",
        verdict
            .p95_latency_ms
            .map_or_else(|| "-".to_string(), |v| v.to_string()),
        pass_mark(verdict.latency_ok),
        verdict.failure_rate * 100.0,
        pass_mark(verdict.failure_ok),
        verdict.conflict_rate * 100.0,
        pass_mark(verdict.conflict_ok),
    );

    if verdict.passed() {
        tracing::info!("run PASSED under {} mode", config.mode);
        ExitCode::SUCCESS
    } else {
        tracing::error!("run FAILED under {} mode", config.mode);
        ExitCode::FAILURE
    }
}

fn pass_mark(ok: bool) -> &'static str {
    if ok { "pass" } else { "FAIL" }
}
