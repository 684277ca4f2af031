//! lockbench - Concurrent load harness for an account-transaction API
//!
//! Exercises the deposit/withdrawal endpoint of an account service under
//! optimistic versioning or pessimistic locking, measuring throughput,
//! contention, and correctness under concurrent actors.
//!
//! # Modules
//!
//! - [`config`] - Run parameters, resolved once at startup
//! - [`models`] - Domain types and wire schemas
//! - [`client`] - HTTP calls against the account service
//! - [`generator`] - Randomized request generation behind a pluggable source
//! - [`classify`] - Response -> outcome classification
//! - [`metrics`] - Concurrency-safe counters and pass/fail thresholds
//! - [`scheduler`] - Shared-pool actor scheduling with think time
//! - [`lifecycle`] - Before/after snapshots and delta reporting
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - Error taxonomy
//!
//! The harness detects and reports contention; it never retries a failed
//! or conflicting transaction.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod generator;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod scheduler;

// Convenient re-exports at crate root
pub use classify::classify;
pub use client::AccountClient;
pub use config::RunConfig;
pub use error::{ClientError, ConfigError};
pub use generator::{EntropySource, FixedSource, TransactionGenerator, ValueSource};
pub use lifecycle::{LifecycleCoordinator, SnapshotDelta};
pub use metrics::{MetricsSnapshot, RunMetrics, Thresholds, Verdict};
pub use models::{
    AccountSnapshot, LockingMode, RawResponse, TransactionOutcome, TransactionRequest,
    TransactionType,
};
pub use scheduler::{RunReport, Scheduler, ThinkTime};
