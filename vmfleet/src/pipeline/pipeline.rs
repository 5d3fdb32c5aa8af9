//! Sequential pipeline executor.
//!
//! Runs the tasks of an execution plan one after another, stopping at the
//! first failure. Tasks after a failed task are never started.

use super::metrics::{PipelineMetrics, TaskMetrics};
use super::task::BoxedTask;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use vmfleet_shared::errors::VmfleetError;

pub struct ExecutionPlan<Ctx> {
    tasks: Vec<BoxedTask<Ctx>>,
}

impl<Ctx> ExecutionPlan<Ctx> {
    pub fn new(tasks: Vec<BoxedTask<Ctx>>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name().to_string()).collect()
    }
}

/// The first failing task of a pipeline run.
#[derive(Debug)]
pub struct PipelineFailure {
    /// Position of the failed task in the plan.
    pub index: usize,
    pub task: String,
    pub error: VmfleetError,
    /// Metrics for the tasks that completed before the failure.
    pub completed: PipelineMetrics,
}

pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Execute a plan against a shared context.
    ///
    /// The cancellation token is checked before each task starts and raced
    /// against the running task; a cancelled task is dropped mid-flight and
    /// reported as [`VmfleetError::Cancelled`].
    pub async fn execute<Ctx>(
        plan: ExecutionPlan<Ctx>,
        ctx: Ctx,
        cancel: &CancellationToken,
    ) -> Result<PipelineMetrics, PipelineFailure>
    where
        Ctx: Clone + Send,
    {
        let total_start = Instant::now();
        tracing::debug!(tasks = plan.len(), "Executing pipeline");
        let mut tasks = Vec::with_capacity(plan.len());

        for (index, task) in plan.tasks.into_iter().enumerate() {
            let name = task.name().to_string();
            let task_start = Instant::now();

            let result = if cancel.is_cancelled() {
                Err(VmfleetError::Cancelled)
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(VmfleetError::Cancelled),
                    result = task.run(ctx.clone()) => result,
                }
            };

            if let Err(error) = result {
                return Err(PipelineFailure {
                    index,
                    task: name,
                    error,
                    completed: PipelineMetrics {
                        total_duration_ms: total_start.elapsed().as_millis(),
                        tasks,
                    },
                });
            }

            tasks.push(TaskMetrics {
                name,
                duration_ms: task_start.elapsed().as_millis(),
            });
        }

        Ok(PipelineMetrics {
            total_duration_ms: total_start.elapsed().as_millis(),
            tasks,
        })
    }
}
