//! Bounded, non-blocking dispatch of liveness diagnostics.
//!
//! Each check runs as its own tokio task. At most `max_concurrent_checks`
//! run at once; extra requests are rejected rather than queued. A check
//! cannot be cancelled once started. Completed results stay retrievable
//! for `result_retention_secs` and are evicted lazily on the next access.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DiagnosticContext, DiagnosticResult, DiagnosticsConfig};
use crate::domain::ports::DiagnosticOracle;

enum CheckState {
    InFlight(watch::Receiver<Option<DiagnosticResult>>),
    Completed {
        result: DiagnosticResult,
        completed_at: Instant,
    },
}

type CheckTable = Arc<Mutex<HashMap<String, CheckState>>>;

/// Owns the table of pending and completed checks for one session.
pub struct DiagnosticDispatcher {
    oracle: Arc<dyn DiagnosticOracle>,
    config: DiagnosticsConfig,
    permits: Arc<Semaphore>,
    checks: CheckTable,
}

impl DiagnosticDispatcher {
    pub fn new(oracle: Arc<dyn DiagnosticOracle>, config: DiagnosticsConfig) -> DomainResult<Self> {
        if config.max_concurrent_checks == 0 {
            return Err(DomainError::Configuration(
                "max_concurrent_checks must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            oracle,
            permits: Arc::new(Semaphore::new(config.max_concurrent_checks)),
            config,
            checks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub const fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    fn retention(&self) -> Duration {
        Duration::from_secs(self.config.result_retention_secs)
    }

    fn evict_expired(checks: &mut HashMap<String, CheckState>, retention: Duration) {
        let now = Instant::now();
        checks.retain(|_, state| match state {
            CheckState::InFlight(_) => true,
            CheckState::Completed { completed_at, .. } => now.duration_since(*completed_at) < retention,
        });
    }

    /// Start a background check.
    ///
    /// Returns `false` without side effects when the concurrency limit is
    /// reached or a check with the same id is already running.
    pub async fn start_check(&self, check_id: &str, context: DiagnosticContext) -> bool {
        let mut checks = self.checks.lock().await;
        Self::evict_expired(&mut checks, self.retention());

        if matches!(checks.get(check_id), Some(CheckState::InFlight(_))) {
            debug!(check_id = %check_id, "diagnostic already running");
            return false;
        }

        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            info!(
                check_id = %check_id,
                max_concurrent_checks = self.config.max_concurrent_checks,
                "diagnostic rejected, concurrency limit reached"
            );
            return false;
        };

        let (tx, rx) = watch::channel(None);
        checks.insert(check_id.to_string(), CheckState::InFlight(rx));
        drop(checks);

        let oracle = Arc::clone(&self.oracle);
        let table = Arc::clone(&self.checks);
        let id = check_id.to_string();
        info!(check_id = %id, iteration = context.iteration, "diagnostic started");

        tokio::spawn(async move {
            // The oracle runs in its own task so a panic still clears the entry.
            let call_id = id.clone();
            let outcome = match tokio::spawn(async move { oracle.diagnose(&call_id, &context).await }).await {
                Ok(outcome) => outcome,
                Err(e) => Err(DomainError::ExecutionFailed(format!("diagnostic task aborted: {e}"))),
            };
            let mut checks = table.lock().await;
            match outcome {
                Ok(result) => {
                    info!(check_id = %id, verdict = result.verdict.as_str(), "diagnostic completed");
                    checks.insert(
                        id,
                        CheckState::Completed {
                            result: result.clone(),
                            completed_at: Instant::now(),
                        },
                    );
                    let _ = tx.send(Some(result));
                }
                Err(e) => {
                    warn!(check_id = %id, error = %e, "diagnostic oracle failed, no result recorded");
                    checks.remove(&id);
                    // waiters see a closed channel
                    drop(tx);
                }
            }
            drop(checks);
            drop(permit);
        });

        true
    }

    /// Latest result for `check_id`.
    ///
    /// With a zero `wait` this never blocks. Otherwise an in-flight check is
    /// raced against the timer; on timeout `None` is returned and the check
    /// keeps running.
    pub async fn get_latest_result(&self, check_id: &str, wait: Duration) -> Option<DiagnosticResult> {
        let mut rx = {
            let mut checks = self.checks.lock().await;
            Self::evict_expired(&mut checks, self.retention());
            match checks.get(check_id)? {
                CheckState::Completed { result, .. } => return Some(result.clone()),
                CheckState::InFlight(rx) => rx.clone(),
            }
        };

        if wait.is_zero() {
            return None;
        }

        let waited = tokio::time::timeout(wait, rx.wait_for(Option::is_some)).await;
        match waited {
            Ok(Ok(value)) => (*value).clone(),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(check_id = %check_id, wait_ms = wait.as_millis(), "diagnostic wait timed out");
                None
            }
        }
    }

    /// Number of checks currently in flight.
    pub async fn running_checks(&self) -> usize {
        self.checks
            .lock()
            .await
            .values()
            .filter(|state| matches!(state, CheckState::InFlight(_)))
            .count()
    }

    /// Wait for a result using the configured `result_wait_ms`.
    pub async fn poll_result(&self, check_id: &str) -> Option<DiagnosticResult> {
        self.get_latest_result(check_id, Duration::from_millis(self.config.result_wait_ms))
            .await
    }
}
