//! Task: Clone the template into a new, powered-off VM.

use super::{ProvisionCtx, call_provider, log_task_error, task_start};
use crate::pipeline::PipelineTask;
use crate::provider::CloneRequest;
use crate::provision::ProvisioningStep;
use async_trait::async_trait;
use vmfleet_shared::errors::VmfleetResult;

pub struct CloneTask;

#[async_trait]
impl PipelineTask<ProvisionCtx> for CloneTask {
    async fn run(self: Box<Self>, ctx: ProvisionCtx) -> VmfleetResult<()> {
        let step = ProvisioningStep::Clone;
        task_start(&ctx, step)?;

        let request = CloneRequest::from(ctx.server.as_ref());
        call_provider(&ctx, step, ctx.provider.clone_vm(&request))
            .await
            .inspect_err(|e| log_task_error(&ctx.server.name, step, e))
    }

    fn name(&self) -> &str {
        ProvisioningStep::Clone.as_str()
    }
}
