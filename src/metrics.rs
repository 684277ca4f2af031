//! Concurrency-safe metrics accumulation and threshold evaluation
//!
//! One `RunMetrics` instance is owned by the scheduler and shared with every
//! actor; increments are relaxed atomics, distribution samples sit behind a
//! mutex. Read exactly once at run end via `snapshot()`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;

use crate::models::{TransactionOutcome, TransactionType};

// ============================================================
// ACCUMULATOR
// ============================================================

/// Shared accumulator. Tolerates concurrent, uncoordinated writers;
/// no update is lost and no ordering is imposed on callers.
#[derive(Debug, Default)]
pub struct RunMetrics {
    /// Deposit attempts (counted before the outcome is known)
    deposits: AtomicU64,
    /// Withdrawal attempts (counted before the outcome is known)
    withdrawals: AtomicU64,
    successes: AtomicU64,
    conflicts: AtomicU64,
    validation_errors: AtomicU64,
    other_errors: AtomicU64,

    /// Per-request latency samples, milliseconds
    latency_ms: Mutex<Vec<u64>>,
    /// Observed post-transaction balances, in arrival order
    balance_trend: Mutex<Vec<Decimal>>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an attempt for the chosen transaction type. Called before the
    /// request is submitted, so attempts >= completions.
    pub fn record_attempt(&self, tx_type: TransactionType) {
        match tx_type {
            TransactionType::Deposit => self.deposits.fetch_add(1, Ordering::Relaxed),
            TransactionType::Withdrawal => self.withdrawals.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_latency(&self, ms: u64) {
        if let Ok(mut samples) = self.latency_ms.lock() {
            samples.push(ms);
        }
    }

    /// Fold one classified outcome into the counters
    pub fn accept(&self, outcome: &TransactionOutcome) {
        match outcome {
            TransactionOutcome::Success { account, .. } => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                if let Some(balance) = account.balance
                    && let Ok(mut trend) = self.balance_trend.lock()
                {
                    trend.push(balance);
                }
            }
            TransactionOutcome::VersionConflict => {
                self.conflicts.fetch_add(1, Ordering::Relaxed);
            }
            TransactionOutcome::ValidationError(_) => {
                self.validation_errors.fetch_add(1, Ordering::Relaxed);
            }
            TransactionOutcome::OtherError { .. } => {
                self.other_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Plain-value snapshot, read once at run end
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            deposits: self.deposits.load(Ordering::Relaxed),
            withdrawals: self.withdrawals.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            other_errors: self.other_errors.load(Ordering::Relaxed),
            latency_ms: self.latency_ms.lock().map(|s| s.clone()).unwrap_or_default(),
            balance_trend: self
                .balance_trend
                .lock()
                .map(|t| t.clone())
                .unwrap_or_default(),
        }
    }
}

// ============================================================
// SNAPSHOT
// ============================================================

/// Immutable view of the counters at run end
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub deposits: u64,
    pub withdrawals: u64,
    pub successes: u64,
    pub conflicts: u64,
    pub validation_errors: u64,
    pub other_errors: u64,
    pub latency_ms: Vec<u64>,
    pub balance_trend: Vec<Decimal>,
}

impl MetricsSnapshot {
    /// Completed iterations: the four outcome categories sum to this
    pub fn completed(&self) -> u64 {
        self.successes + self.conflicts + self.validation_errors + self.other_errors
    }

    /// Non-success outcomes over completed iterations. A 409 counts as a
    /// failed request here, matching how HTTP-level failure rates treat it;
    /// contention additionally gets its own dedicated rate below.
    pub fn failure_rate(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            return 0.0;
        }
        (completed - self.successes) as f64 / completed as f64
    }

    /// Conflicts over completed iterations. Meaningful under OPTIMISTIC;
    /// under PESSIMISTIC any non-zero value is itself an anomaly.
    pub fn conflict_rate(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            return 0.0;
        }
        self.conflicts as f64 / completed as f64
    }

    /// Latency percentile over the collected samples, None when empty
    pub fn latency_percentile(&self, p: f64) -> Option<u64> {
        if self.latency_ms.is_empty() {
            return None;
        }
        let mut sorted = self.latency_ms.clone();
        sorted.sort_unstable();
        let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    /// (min, max, last) of observed balances, None when no successes landed
    pub fn balance_summary(&self) -> Option<(Decimal, Decimal, Decimal)> {
        let min = self.balance_trend.iter().min()?;
        let max = self.balance_trend.iter().max()?;
        let last = self.balance_trend.last()?;
        Some((*min, *max, *last))
    }
}

// ============================================================
// THRESHOLDS
// ============================================================

/// Pass/fail predicates evaluated over the final snapshot
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// p95 request latency must stay below this, milliseconds
    pub p95_latency_ms: u64,
    pub max_failure_rate: f64,
    pub max_conflict_rate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            p95_latency_ms: 2000,
            max_failure_rate: 0.10,
            max_conflict_rate: 0.30,
        }
    }
}

impl Thresholds {
    /// Evaluate the three predicates independently. A breach is reported in
    /// the verdict, never raised as an error.
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Verdict {
        let p95 = snapshot.latency_percentile(95.0);
        let failure_rate = snapshot.failure_rate();
        let conflict_rate = snapshot.conflict_rate();

        Verdict {
            p95_latency_ms: p95,
            failure_rate,
            conflict_rate,
            latency_ok: p95.is_none_or(|v| v < self.p95_latency_ms),
            failure_ok: failure_rate < self.max_failure_rate,
            conflict_ok: conflict_rate < self.max_conflict_rate,
        }
    }
}

/// The run's externally visible result: conjunction of three predicates
#[derive(Debug, Clone)]
pub struct Verdict {
    pub p95_latency_ms: Option<u64>,
    pub failure_rate: f64,
    pub conflict_rate: f64,
    pub latency_ok: bool,
    pub failure_ok: bool,
    pub conflict_ok: bool,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.latency_ok && self.failure_ok && self.conflict_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountView;
    use std::sync::Arc;

    fn success_outcome(balance: &str) -> TransactionOutcome {
        TransactionOutcome::Success {
            account: AccountView {
                id: Some("a1".to_string()),
                balance: Some(balance.parse().unwrap()),
                version: Some(1),
                owner_name: None,
                currency: Some("USD".to_string()),
            },
            transaction_id: "t1".to_string(),
        }
    }

    #[test]
    fn test_outcome_counts_sum_to_completed() {
        let metrics = RunMetrics::new();
        metrics.accept(&success_outcome("10"));
        metrics.accept(&success_outcome("20"));
        metrics.accept(&TransactionOutcome::VersionConflict);
        metrics.accept(&TransactionOutcome::ValidationError("bad".to_string()));
        metrics.accept(&TransactionOutcome::OtherError {
            status: Some(500),
            detail: "boom".to_string(),
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.successes, 2);
        assert_eq!(snapshot.conflicts, 1);
        assert_eq!(snapshot.validation_errors, 1);
        assert_eq!(snapshot.other_errors, 1);
        assert_eq!(snapshot.completed(), 5);
        assert_eq!(snapshot.balance_trend.len(), 2);
    }

    #[test]
    fn test_concurrent_accept_loses_nothing() {
        let metrics = Arc::new(RunMetrics::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let metrics = Arc::clone(&metrics);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    metrics.accept(&TransactionOutcome::VersionConflict);
                    metrics.record_attempt(TransactionType::Deposit);
                    metrics.record_latency(5);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.conflicts, 8000);
        assert_eq!(snapshot.deposits, 8000);
        assert_eq!(snapshot.latency_ms.len(), 8000);
    }

    #[test]
    fn test_rates() {
        let metrics = RunMetrics::new();
        for _ in 0..7 {
            metrics.accept(&success_outcome("5"));
        }
        metrics.accept(&TransactionOutcome::VersionConflict);
        metrics.accept(&TransactionOutcome::VersionConflict);
        metrics.accept(&TransactionOutcome::OtherError {
            status: None,
            detail: "timeout".to_string(),
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.completed(), 10);
        assert!((snapshot.failure_rate() - 0.3).abs() < 1e-9);
        assert!((snapshot.conflict_rate() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_p95_latency() {
        let metrics = RunMetrics::new();
        for ms in 1..=100 {
            metrics.record_latency(ms);
        }
        let snapshot = metrics.snapshot();
        let p95 = snapshot.latency_percentile(95.0).unwrap();
        assert!((95..=96).contains(&p95), "p95 = {p95}");
    }

    #[test]
    fn test_verdict_is_order_independent_conjunction() {
        let snapshot = MetricsSnapshot {
            deposits: 5,
            withdrawals: 5,
            successes: 5,
            conflicts: 5,
            validation_errors: 0,
            other_errors: 0,
            latency_ms: vec![10; 10],
            balance_trend: Vec::new(),
        };

        // conflict rate 0.5 breaches; failure rate 0.5 breaches; latency fine
        let verdict = Thresholds::default().evaluate(&snapshot);
        assert!(verdict.latency_ok);
        assert!(!verdict.failure_ok);
        assert!(!verdict.conflict_ok);
        assert!(!verdict.passed());
        assert_eq!(
            verdict.passed(),
            verdict.conflict_ok && verdict.latency_ok && verdict.failure_ok
        );
    }

    #[test]
    fn test_empty_run_passes_thresholds() {
        let snapshot = RunMetrics::new().snapshot();
        let verdict = Thresholds::default().evaluate(&snapshot);
        assert!(verdict.passed());
        assert_eq!(verdict.p95_latency_ms, None);
    }

    #[test]
    fn test_balance_summary() {
        let metrics = RunMetrics::new();
        metrics.accept(&success_outcome("30"));
        metrics.accept(&success_outcome("10"));
        metrics.accept(&success_outcome("20"));
        let (min, max, last) = metrics.snapshot().balance_summary().unwrap();
        assert_eq!(min, "10".parse().unwrap());
        assert_eq!(max, "30".parse().unwrap());
        assert_eq!(last, "20".parse().unwrap());
    }
}
