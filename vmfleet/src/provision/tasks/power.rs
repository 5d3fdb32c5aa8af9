//! Task: Power on the VM.

use super::{ProvisionCtx, call_provider, log_task_error, task_start};
use crate::pipeline::PipelineTask;
use crate::provider::PowerRequest;
use crate::provision::ProvisioningStep;
use async_trait::async_trait;
use vmfleet_shared::errors::VmfleetResult;

pub struct PowerOnTask;

#[async_trait]
impl PipelineTask<ProvisionCtx> for PowerOnTask {
    async fn run(self: Box<Self>, ctx: ProvisionCtx) -> VmfleetResult<()> {
        let step = ProvisioningStep::PowerOn;
        task_start(&ctx, step)?;

        let request = PowerRequest::from(ctx.server.as_ref());
        call_provider(&ctx, step, ctx.provider.power_on(&request))
            .await
            .inspect_err(|e| log_task_error(&ctx.server.name, step, e))?;

        tracing::info!(server = %ctx.server.name, ip = %ctx.server.ip_address, "VM powered on");
        Ok(())
    }

    fn name(&self) -> &str {
        ProvisioningStep::PowerOn.as_str()
    }
}
