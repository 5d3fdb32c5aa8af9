//! Fleet-wide run report.

use crate::provision::ProvisioningOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use ulid::Ulid;
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

/// Aggregated result of one batch run.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub run_id: Ulid,
    /// Number of servers submitted to the run.
    pub total: usize,
    /// Outcomes in completion order, which need not match submission order.
    pub outcomes: Vec<ProvisioningOutcome>,
    /// Servers never dispatched because the run was cancelled.
    pub not_started: Vec<String>,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &ProvisioningOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProvisioningOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn succeeded_servers(&self) -> Vec<&str> {
        self.succeeded().map(|o| o.server.as_str()).collect()
    }

    pub fn outcome(&self, server: &str) -> Option<&ProvisioningOutcome> {
        self.outcomes.iter().find(|o| o.server == server)
    }

    /// True only when every submitted server reached `Succeeded`.
    pub fn is_success(&self) -> bool {
        !self.cancelled
            && self.not_started.is_empty()
            && self.outcomes.len() == self.total
            && self.outcomes.iter().all(|o| o.is_success())
    }

    /// Process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// One actionable line per failed or skipped server.
    pub fn failure_lines(&self) -> Vec<String> {
        let failed = self.failed().map(|o| match &o.failure {
            Some(failure) => format!("{}: failed at {}", o.server, failure),
            None => format!("{}: failed in state {:?}", o.server, o.state),
        });
        let skipped = self
            .not_started
            .iter()
            .map(|name| format!("{}: not started (run cancelled)", name));
        failed.chain(skipped).collect()
    }

    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            total = self.total,
            succeeded = self.succeeded().count(),
            failed = self.failed().count(),
            not_started = self.not_started.len(),
            duration_ms = (self.finished_at - self.started_at).num_milliseconds(),
            "Batch finished"
        );
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> VmfleetResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| VmfleetError::Internal(format!("failed to serialize report: {}", e)))?;
        std::fs::write(path, json).map_err(|e| {
            VmfleetError::Storage(format!(
                "failed to write report {}: {}",
                path.display(),
                e
            ))
        })
    }
}
