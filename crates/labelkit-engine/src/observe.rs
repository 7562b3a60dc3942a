//! Observability hook for evaluation and fetch outcomes.

use std::sync::Mutex;

use crate::error::EngineError;
use crate::evaluate::Decision;
use crate::orchestrator::PassReport;

/// Receives engine events. Every method defaults to a no-op.
pub trait Observer: Send + Sync {
    fn label_evaluated(&self, _decision: &Decision) {}

    fn endpoint_failed(&self, _endpoint: &str, _error: &EngineError) {}

    fn pass_completed(&self, _report: &PassReport) {}
}

/// Forwards events to `tracing`: decisions at `debug`, endpoint failures at
/// `warn`, pass summaries at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn label_evaluated(&self, decision: &Decision) {
        tracing::debug!(
            label_id = %decision.label_id,
            product_id = decision.product_id.as_deref().unwrap_or("-"),
            matched = decision.matched,
            reason = %decision.reason,
            "label evaluated"
        );
    }

    fn endpoint_failed(&self, endpoint: &str, error: &EngineError) {
        tracing::warn!(endpoint, error = %error, "label endpoint failed; trying next");
    }

    fn pass_completed(&self, report: &PassReport) {
        tracing::info!(
            page_type = %report.page_type,
            products = report.products_seen,
            labels = report.labels_considered,
            badges = report.badges_rendered,
            "label pass complete"
        );
    }
}

/// Records every event in memory, for tests and for the CLI's evaluation
/// report.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    decisions: Mutex<Vec<Decision>>,
    failures: Mutex<Vec<(String, String)>>,
    passes: Mutex<Vec<PassReport>>,
}

impl MemoryObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn decisions(&self) -> Vec<Decision> {
        self.decisions.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// `(endpoint, error message)` pairs in the order they failed.
    #[must_use]
    pub fn failures(&self) -> Vec<(String, String)> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn passes(&self) -> Vec<PassReport> {
        self.passes.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Observer for MemoryObserver {
    fn label_evaluated(&self, decision: &Decision) {
        if let Ok(mut decisions) = self.decisions.lock() {
            decisions.push(decision.clone());
        }
    }

    fn endpoint_failed(&self, endpoint: &str, error: &EngineError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((endpoint.to_string(), error.to_string()));
        }
    }

    fn pass_completed(&self, report: &PassReport) {
        if let Ok(mut passes) = self.passes.lock() {
            passes.push(report.clone());
        }
    }
}

/// Sends every event to two observers.
pub struct Tee<A, B>(pub A, pub B);

impl<A: Observer, B: Observer> Observer for Tee<A, B> {
    fn label_evaluated(&self, decision: &Decision) {
        self.0.label_evaluated(decision);
        self.1.label_evaluated(decision);
    }

    fn endpoint_failed(&self, endpoint: &str, error: &EngineError) {
        self.0.endpoint_failed(endpoint, error);
        self.1.endpoint_failed(endpoint, error);
    }

    fn pass_completed(&self, report: &PassReport) {
        self.0.pass_completed(report);
        self.1.pass_completed(report);
    }
}

impl<T: Observer + ?Sized> Observer for &T {
    fn label_evaluated(&self, decision: &Decision) {
        (**self).label_evaluated(decision);
    }

    fn endpoint_failed(&self, endpoint: &str, error: &EngineError) {
        (**self).endpoint_failed(endpoint, error);
    }

    fn pass_completed(&self, report: &PassReport) {
        (**self).pass_completed(report);
    }
}
