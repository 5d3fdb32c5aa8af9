//! Per-server provisioning pipeline.
//!
//! ## Architecture
//!
//! Every server runs the same fixed plan, one task per step:
//!
//! ```text
//!   1. Clone            (template → powered-off VM)
//!   2. CreateDisk       (thick application disk, size checked first)
//!   3. ConnectAdapter   (primary NIC starts connected)
//!   4. AssignNetwork    (static IP via customization)
//!   5. PowerOn
//! ```
//!
//! Fail-fast: the first failing step ends the server's run. Nothing is
//! retried and nothing created by earlier steps is torn down; a failed
//! server is fixed by the operator and re-run.

mod tasks;
mod types;

pub use tasks::ProvisionCtx;
pub use types::{
    ProvisionContext, ProvisioningOutcome, ProvisioningStep, ServerState, StepFailure,
};

use crate::config::{DEFAULT_CALL_TIMEOUT_SECS, ServerDescriptor};
use crate::pipeline::{ExecutionPlan, PipelineExecutor, PipelineMetrics};
use crate::provider::VirtualizationProvider;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Options applied to every server's pipeline.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// Upper bound for each individual provider call.
    pub call_timeout: Duration,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

/// Get the execution plan shared by every server.
fn get_execution_plan() -> ExecutionPlan<ProvisionCtx> {
    ExecutionPlan::new(
        ProvisioningStep::ALL
            .into_iter()
            .map(tasks::task_for)
            .collect(),
    )
}

/// Runs the provisioning pipeline for one server at a time.
///
/// Holds only read-only shared state, so a single instance serves any
/// number of concurrent workers.
pub struct Provisioner {
    provider: Arc<dyn VirtualizationProvider>,
    options: ProvisionOptions,
}

impl Provisioner {
    pub fn new(provider: Arc<dyn VirtualizationProvider>, options: ProvisionOptions) -> Self {
        Self { provider, options }
    }

    /// Drive one server through every step and report how far it got.
    ///
    /// Never returns an error: every failure, including cancellation, is
    /// folded into the outcome.
    pub async fn provision(
        &self,
        server: Arc<ServerDescriptor>,
        cancel: &CancellationToken,
    ) -> ProvisioningOutcome {
        let started_at = Utc::now();
        let ctx: ProvisionCtx = Arc::new(ProvisionContext::new(
            Arc::clone(&server),
            Arc::clone(&self.provider),
            self.options.call_timeout,
        ));

        let span = tracing::info_span!("provision", server = %server.name);
        let result = PipelineExecutor::execute(get_execution_plan(), Arc::clone(&ctx), cancel)
            .instrument(span)
            .await;

        let (metrics, failure) = match result {
            Ok(metrics) => match ctx.advance(ServerState::Succeeded) {
                Ok(()) => (metrics, None),
                Err(error) => (
                    metrics,
                    Some(StepFailure {
                        step: ProvisioningStep::PowerOn,
                        error,
                    }),
                ),
            },
            Err(failure) => {
                let step = failed_step(&failure.task, &ctx.state());
                // A pipeline cancelled before its first step never left NotStarted.
                if ctx.state().running_step().is_some()
                    && let Err(e) = ctx.advance(ServerState::Failed(step))
                {
                    tracing::warn!(server = %server.name, error = %e, "Failed to record failure state");
                }
                (
                    failure.completed,
                    Some(StepFailure {
                        step,
                        error: failure.error,
                    }),
                )
            }
        };

        let outcome = ProvisioningOutcome {
            server: server.name.clone(),
            state: ctx.state(),
            completed_steps: completed_steps(&metrics),
            failure,
            metrics,
            started_at,
            finished_at: Utc::now(),
        };

        match &outcome.failure {
            None => tracing::info!(
                server = %outcome.server,
                duration_ms = outcome.metrics.total_duration_ms,
                "Server provisioned"
            ),
            Some(failure) => tracing::error!(
                server = %outcome.server,
                step = %failure.step,
                error = %failure.error,
                "Server provisioning failed"
            ),
        }

        outcome
    }
}

/// Step a failed task belongs to. Falls back to the step the state machine
/// was running, then to the first step for a pipeline that never started.
fn failed_step(task: &str, state: &ServerState) -> ProvisioningStep {
    ProvisioningStep::from_name(task)
        .or_else(|| state.running_step())
        .unwrap_or(ProvisioningStep::Clone)
}

fn completed_steps(metrics: &PipelineMetrics) -> Vec<ProvisioningStep> {
    ProvisioningStep::ALL
        .into_iter()
        .filter(|step| metrics.task_duration_ms(step.as_str()).is_some())
        .collect()
}
