//! Task: Attach the application disk.
//!
//! The disk size is checked while building the request, before the
//! provider is called. A server without a positive size fails here with
//! `InvalidConfiguration` and makes no remote call.

use super::{ProvisionCtx, call_provider, log_task_error, task_start};
use crate::pipeline::PipelineTask;
use crate::provider::DiskRequest;
use crate::provision::ProvisioningStep;
use async_trait::async_trait;
use vmfleet_shared::errors::VmfleetResult;

pub struct CreateDiskTask;

#[async_trait]
impl PipelineTask<ProvisionCtx> for CreateDiskTask {
    async fn run(self: Box<Self>, ctx: ProvisionCtx) -> VmfleetResult<()> {
        let step = ProvisioningStep::CreateDisk;
        task_start(&ctx, step)?;

        let request = DiskRequest::for_server(&ctx.server)
            .inspect_err(|e| log_task_error(&ctx.server.name, step, e))?;

        tracing::debug!(
            server = %ctx.server.name,
            disk = %request.disk_name,
            size_gb = request.size_gb,
            "Creating application disk"
        );

        call_provider(&ctx, step, ctx.provider.create_disk(&request))
            .await
            .inspect_err(|e| log_task_error(&ctx.server.name, step, e))
    }

    fn name(&self) -> &str {
        ProvisioningStep::CreateDisk.as_str()
    }
}
