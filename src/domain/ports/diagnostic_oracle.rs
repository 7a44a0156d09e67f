//! Diagnostic oracle port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{DiagnosticContext, DiagnosticResult};

/// Classifies a suspected stall.
///
/// Calls may take arbitrarily long; the dispatcher runs them in the
/// background and never cancels one once started.
#[async_trait]
pub trait DiagnosticOracle: Send + Sync {
    async fn diagnose(&self, check_id: &str, context: &DiagnosticContext) -> DomainResult<DiagnosticResult>;
}
