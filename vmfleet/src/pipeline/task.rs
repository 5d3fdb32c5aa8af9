//! Task trait for pipeline execution.

use async_trait::async_trait;
use vmfleet_shared::errors::VmfleetResult;

/// A single step of an [`ExecutionPlan`](super::ExecutionPlan).
///
/// Tasks receive a clone of the shared context; anything a later task needs
/// must be written back through interior mutability.
#[async_trait]
pub trait PipelineTask<Ctx>: Send + Sync {
    async fn run(self: Box<Self>, ctx: Ctx) -> VmfleetResult<()>;

    /// Stable task name, used in logs and metrics.
    fn name(&self) -> &str;
}

pub type BoxedTask<Ctx> = Box<dyn PipelineTask<Ctx>>;
