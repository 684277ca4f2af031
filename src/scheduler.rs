//! Concurrent actor scheduling
//!
//! N actors drain one shared iteration pool; the total executed never
//! exceeds the budget and no iteration is claimed twice. A wall-clock
//! deadline stops new claims while in-flight requests finish, producing a
//! partial (not failed) run. Each actor pauses for a sampled think time
//! after every iteration.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

use crate::classify;
use crate::client::AccountClient;
use crate::config::RunConfig;
use crate::generator::{EntropySource, TransactionGenerator, ValueSource};
use crate::metrics::RunMetrics;

// ============================================================
// THINK TIME
// ============================================================

/// Inter-iteration pause policy, sampled uniformly from [min, max]
#[derive(Debug, Clone, Copy)]
pub struct ThinkTime {
    pub min: Duration,
    pub max: Duration,
}

impl Default for ThinkTime {
    fn default() -> Self {
        // Human-ish pacing, same band the service is sized for
        Self {
            min: Duration::from_millis(500),
            max: Duration::from_millis(2000),
        }
    }
}

impl ThinkTime {
    /// No pause at all; keeps tests off the wall clock
    pub fn zero() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn sample(&self, source: &mut dyn ValueSource) -> Duration {
        let span = self.max.saturating_sub(self.min);
        self.min + span.mul_f64(source.next())
    }
}

// ============================================================
// RUN REPORT
// ============================================================

/// What actually happened, reported at run end
#[derive(Debug, Clone)]
pub struct RunReport {
    pub requested: u64,
    pub completed: u64,
    pub elapsed: Duration,
    /// True when the deadline cut the run short of its budget
    pub partial: bool,
}

// ============================================================
// SCHEDULER
// ============================================================

pub struct Scheduler {
    config: Arc<RunConfig>,
    client: Arc<AccountClient>,
    metrics: Arc<RunMetrics>,
    think_time: ThinkTime,
}

impl Scheduler {
    pub fn new(
        config: Arc<RunConfig>,
        client: Arc<AccountClient>,
        metrics: Arc<RunMetrics>,
        think_time: ThinkTime,
    ) -> Self {
        Self {
            config,
            client,
            metrics,
            think_time,
        }
    }

    /// Spawn the actor pool and wait for every actor to drain out
    pub async fn run(&self) -> RunReport {
        let requested = self.config.iterations;
        let pool = Arc::new(AtomicU64::new(0));
        let started = Instant::now();
        // A cap too large to represent as an instant means no deadline at all
        let deadline = started.checked_add(self.config.max_duration);

        info!(
            "scheduler starting: {} actors, {} iterations, cap {:?}",
            self.config.actors, requested, self.config.max_duration
        );

        let mut handles = Vec::with_capacity(self.config.actors);
        for actor_id in 0..self.config.actors {
            let config = Arc::clone(&self.config);
            let client = Arc::clone(&self.client);
            let metrics = Arc::clone(&self.metrics);
            let pool = Arc::clone(&pool);
            let think_time = self.think_time;

            handles.push(tokio::spawn(async move {
                let mut source = EntropySource;
                actor_loop(
                    actor_id, &config, &client, &metrics, &pool, deadline, think_time, &mut source,
                )
                .await
            }));
        }

        let mut completed = 0u64;
        for handle in handles {
            match handle.await {
                Ok(count) => completed += count,
                Err(e) => error!("actor task failed: {e}"),
            }
        }

        let elapsed = started.elapsed();
        let partial = completed < requested;
        if partial {
            info!(
                "run ended early: {}/{} iterations in {:?}",
                completed, requested, elapsed
            );
        } else {
            info!("run complete: {} iterations in {:?}", completed, elapsed);
        }

        RunReport {
            requested,
            completed,
            elapsed,
            partial,
        }
    }
}

/// One actor: claim, execute, think, repeat. Returns iterations completed.
#[allow(clippy::too_many_arguments)]
async fn actor_loop(
    actor_id: usize,
    config: &RunConfig,
    client: &AccountClient,
    metrics: &RunMetrics,
    pool: &AtomicU64,
    deadline: Option<Instant>,
    think_time: ThinkTime,
    source: &mut dyn ValueSource,
) -> u64 {
    let mut completed = 0u64;

    loop {
        // Refuse new claims once the cap has elapsed; the iteration already
        // in flight was allowed to finish before we got back here.
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!("actor {actor_id} stopping: deadline reached");
            break;
        }

        let claimed = pool.fetch_add(1, Ordering::Relaxed);
        if claimed >= config.iterations {
            debug!("actor {actor_id} stopping: pool exhausted");
            break;
        }

        execute_iteration(config, client, metrics, source).await;
        completed += 1;

        let pause = think_time.sample(source);
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }

    completed
}

/// One iteration: generate, count the attempt, submit, classify, accumulate
async fn execute_iteration(
    config: &RunConfig,
    client: &AccountClient,
    metrics: &RunMetrics,
    source: &mut dyn ValueSource,
) {
    let request = TransactionGenerator::next_request(source, config.mode);
    // Attempt counters move before the outcome is known
    metrics.record_attempt(request.r#type);

    let submitted = Instant::now();
    let result = client.submit(&request).await;
    metrics.record_latency(submitted.elapsed().as_millis() as u64);

    let outcome = classify::classify(result);
    classify::log_outcome(config.mode, &request, &outcome);
    metrics.accept(&outcome);
}
