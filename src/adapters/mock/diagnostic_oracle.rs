//! Mock diagnostic oracle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DiagnosticContext, DiagnosticResult, DiagnosticVerdict};
use crate::domain::ports::DiagnosticOracle;

/// Oracle that answers with a fixed verdict after an optional delay.
#[derive(Debug)]
pub struct MockDiagnosticOracle {
    verdict: DiagnosticVerdict,
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl MockDiagnosticOracle {
    pub const fn new(verdict: DiagnosticVerdict) -> Self {
        Self {
            verdict,
            delay: Duration::ZERO,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Oracle whose every call errors.
    pub const fn failing() -> Self {
        Self {
            verdict: DiagnosticVerdict::Failed,
            delay: Duration::ZERO,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagnosticOracle for MockDiagnosticOracle {
    async fn diagnose(&self, check_id: &str, context: &DiagnosticContext) -> DomainResult<DiagnosticResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(DomainError::ExecutionFailed("diagnostic oracle unreachable".to_string()));
        }
        Ok(DiagnosticResult::new(check_id, self.verdict).with_explanation(format!(
            "{} state changes across {} heartbeats",
            context.recent_state_changes.len(),
            context.recent_heartbeats.len()
        )))
    }
}
