use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

use crate::workflows::ErrorKind;

/// Workflow command counters
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub reports: AtomicU64,
    pub confirmations: AtomicU64,
    pub rejections: AtomicU64,
    pub schedules: AtomicU64,
    pub cancellations: AtomicU64,
    pub completions: AtomicU64,
    pub updates: AtomicU64,
    pub conflicts: AtomicU64,
    pub invalid_transitions: AtomicU64,
    pub validation_failures: AtomicU64,
    pub not_found: AtomicU64,
    pub internal_errors: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, operation: &str) {
        let counter = match operation {
            "report_lost" | "report_found" => &self.reports,
            "confirm_match" => &self.confirmations,
            "reject_match" => &self.rejections,
            "schedule" | "reschedule" => &self.schedules,
            "cancel" => &self.cancellations,
            "complete" => &self.completions,
            "update" => &self.updates,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::Conflict => &self.conflicts,
            ErrorKind::InvalidTransition => &self.invalid_transitions,
            ErrorKind::ValidationError => &self.validation_failures,
            ErrorKind::NotFound => &self.not_found,
            ErrorKind::Internal => {
                warn!("Workflow command failed with an internal error");
                &self.internal_errors
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkflowStats {
        WorkflowStats {
            reports: self.reports.load(Ordering::Relaxed),
            confirmations: self.confirmations.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            schedules: self.schedules.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            invalid_transitions: self.invalid_transitions.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "Workflow metrics: confirmations={}, rejections={}, schedules={}, cancellations={}, completions={}, conflicts={}, invalid_transitions={}",
            stats.confirmations,
            stats.rejections,
            stats.schedules,
            stats.cancellations,
            stats.completions,
            stats.conflicts,
            stats.invalid_transitions
        );
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowStats {
    pub reports: u64,
    pub confirmations: u64,
    pub rejections: u64,
    pub schedules: u64,
    pub cancellations: u64,
    pub completions: u64,
    pub updates: u64,
    pub conflicts: u64,
    pub invalid_transitions: u64,
    pub validation_failures: u64,
    pub not_found: u64,
    pub internal_errors: u64,
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
