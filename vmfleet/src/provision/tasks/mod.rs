//! Provisioning tasks, one per step.

mod adapter;
mod clone;
mod disk;
mod network;
mod power;

use adapter::ConnectAdapterTask;
use clone::CloneTask;
use disk::CreateDiskTask;
use network::AssignNetworkTask;
use power::PowerOnTask;

use super::types::{ProvisionContext, ProvisioningStep};
use crate::pipeline::BoxedTask;
use std::future::Future;
use std::sync::Arc;
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

pub type ProvisionCtx = Arc<ProvisionContext>;

/// Task implementing `step`.
pub(super) fn task_for(step: ProvisioningStep) -> BoxedTask<ProvisionCtx> {
    match step {
        ProvisioningStep::Clone => Box::new(CloneTask),
        ProvisioningStep::CreateDisk => Box::new(CreateDiskTask),
        ProvisioningStep::ConnectAdapter => Box::new(ConnectAdapterTask),
        ProvisioningStep::AssignNetwork => Box::new(AssignNetworkTask),
        ProvisioningStep::PowerOn => Box::new(PowerOnTask),
    }
}

/// Enter the step's running state and log the start.
fn task_start(ctx: &ProvisionCtx, step: ProvisioningStep) -> VmfleetResult<()> {
    ctx.advance(step.running_state())?;
    tracing::info!(server = %ctx.server.name, step = %step, "Starting provisioning step");
    Ok(())
}

fn log_task_error(server: &str, step: ProvisioningStep, err: &VmfleetError) {
    tracing::error!(server = %server, step = %step, error = %err, "Provisioning step failed");
}

/// Await a provider call, bounded by the context's call timeout.
///
/// An elapsed timeout is indistinguishable from an explicit control-plane
/// failure for the step. Dropping the call abandons it.
async fn call_provider<F>(ctx: &ProvisionContext, step: ProvisioningStep, call: F) -> VmfleetResult<()>
where
    F: Future<Output = VmfleetResult<()>>,
{
    match tokio::time::timeout(ctx.call_timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(VmfleetError::provider(
            &ctx.server.name,
            step.operation().as_str(),
            format!("no response within {:?}", ctx.call_timeout),
        )),
    }
}
