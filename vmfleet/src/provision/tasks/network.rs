//! Task: Apply static IP, netmask and gateway.

use super::{ProvisionCtx, call_provider, log_task_error, task_start};
use crate::pipeline::PipelineTask;
use crate::provider::NetworkRequest;
use crate::provision::ProvisioningStep;
use async_trait::async_trait;
use vmfleet_shared::errors::VmfleetResult;

pub struct AssignNetworkTask;

#[async_trait]
impl PipelineTask<ProvisionCtx> for AssignNetworkTask {
    async fn run(self: Box<Self>, ctx: ProvisionCtx) -> VmfleetResult<()> {
        let step = ProvisioningStep::AssignNetwork;
        task_start(&ctx, step)?;

        let request = NetworkRequest::from(ctx.server.as_ref());
        call_provider(&ctx, step, ctx.provider.customize_network(&request))
            .await
            .inspect_err(|e| log_task_error(&ctx.server.name, step, e))
    }

    fn name(&self) -> &str {
        ProvisioningStep::AssignNetwork.as_str()
    }
}
