//! Task: Set the primary network adapter to start connected.

use super::{ProvisionCtx, call_provider, log_task_error, task_start};
use crate::pipeline::PipelineTask;
use crate::provider::AdapterRequest;
use crate::provision::ProvisioningStep;
use async_trait::async_trait;
use vmfleet_shared::errors::VmfleetResult;

pub struct ConnectAdapterTask;

#[async_trait]
impl PipelineTask<ProvisionCtx> for ConnectAdapterTask {
    async fn run(self: Box<Self>, ctx: ProvisionCtx) -> VmfleetResult<()> {
        let step = ProvisioningStep::ConnectAdapter;
        task_start(&ctx, step)?;

        let request = AdapterRequest::from(ctx.server.as_ref());
        call_provider(&ctx, step, ctx.provider.connect_adapter(&request))
            .await
            .inspect_err(|e| log_task_error(&ctx.server.name, step, e))
    }

    fn name(&self) -> &str {
        ProvisioningStep::ConnectAdapter.as_str()
    }
}
