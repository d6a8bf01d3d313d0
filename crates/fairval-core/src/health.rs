//! Per-source success/failure accounting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;

use crate::{SourceId, UtcDateTime};

/// Minimum success ratio for a source that has failed at least once.
pub const HEALTHY_SUCCESS_RATIO: f64 = 0.8;

/// Counters for one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub success_count: u64,
    pub error_count: u64,
    pub last_success: Option<UtcDateTime>,
    pub last_error: Option<UtcDateTime>,
}

impl HealthStatus {
    /// Healthy until the first error, then only while successes exceed 80% of attempts.
    pub fn is_healthy(&self) -> bool {
        if self.error_count == 0 {
            return true;
        }
        let total = self.success_count + self.error_count;
        (self.success_count as f64 / total as f64) > HEALTHY_SUCCESS_RATIO
    }

    fn record(&mut self, success: bool) {
        let now = UtcDateTime::now();
        if success {
            self.success_count = self.success_count.saturating_add(1);
            self.last_success = Some(now);
        } else {
            self.error_count = self.error_count.saturating_add(1);
            self.last_error = Some(now);
        }
    }
}

/// Thread-safe health table keyed by source.
///
/// Each source has its own lock, so updates for one source never wait on
/// another; the outer map lock is only taken for writing when a source is
/// seen for the first time or reset.
#[derive(Debug, Default)]
pub struct HealthTracker {
    sources: RwLock<HashMap<SourceId, Arc<Mutex<HealthStatus>>>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one fetch attempt against `source`.
    pub fn record(&self, source: &SourceId, success: bool) {
        let entry = self.entry(source);
        let mut status = entry.lock().unwrap_or_else(PoisonError::into_inner);
        status.record(success);
    }

    /// Sources never seen are healthy.
    pub fn is_healthy(&self, source: &SourceId) -> bool {
        self.status(source)
            .map(|status| status.is_healthy())
            .unwrap_or(true)
    }

    pub fn status(&self, source: &SourceId) -> Option<HealthStatus> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources
            .get(source)
            .map(|entry| *entry.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Clears the counters of one source. Operator action only.
    pub fn reset(&self, source: &SourceId) {
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.remove(source);
    }

    /// Snapshot of every tracked source, ordered by id.
    pub fn snapshot(&self) -> Vec<(SourceId, HealthStatus)> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries = sources
            .iter()
            .map(|(id, entry)| {
                (
                    id.clone(),
                    *entry.lock().unwrap_or_else(PoisonError::into_inner),
                )
            })
            .collect::<Vec<_>>();
        entries.sort_by(|left, right| left.0.cmp(&right.0));
        entries
    }

    fn entry(&self, source: &SourceId) -> Arc<Mutex<HealthStatus>> {
        {
            let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = sources.get(source) {
                return Arc::clone(entry);
            }
        }

        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sources.entry(source.clone()).or_default())
    }
}
