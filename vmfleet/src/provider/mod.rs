//! Virtualization provider client.
//!
//! A typed capability set over the control plane: one method per
//! provisioning primitive. Callers hold an `Arc<dyn VirtualizationProvider>`
//! and never depend on whether the implementation shells out to a CLI or
//! talks to an API directly.
//!
//! Implementations make exactly one round-trip per call and never retry.
//! Timeouts are applied by the caller.

#[cfg(test)]
pub(crate) mod fake;
mod govc;
mod request;

pub use govc::GovcProvider;
pub use request::{
    AdapterRequest, CloneRequest, DiskRequest, NetworkRequest, PRIMARY_ADAPTER, PowerRequest,
};

use async_trait::async_trait;
use std::fmt;
use vmfleet_shared::errors::VmfleetResult;

/// Control-plane operation, named after the remote command it issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Clone,
    CreateDisk,
    ConnectAdapter,
    CustomizeNetwork,
    PowerOn,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Clone => "vm.clone",
            Operation::CreateDisk => "vm.disk.create",
            Operation::ConnectAdapter => "device.connect",
            Operation::CustomizeNetwork => "vm.customize",
            Operation::PowerOn => "vm.power",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Imperative operations of the virtualization control plane.
///
/// Every method either succeeds or fails with `ProviderOperationFailed`
/// carrying the control plane's diagnostic. Causes such as a missing
/// template or a duplicate VM name are not interpreted here.
#[async_trait]
pub trait VirtualizationProvider: Send + Sync {
    /// Clone the configured template into a new, powered-off VM.
    async fn clone_vm(&self, request: &CloneRequest) -> VmfleetResult<()>;

    /// Attach a new disk to an existing VM.
    async fn create_disk(&self, request: &DiskRequest) -> VmfleetResult<()>;

    /// Mark a network adapter as connected at power-on.
    async fn connect_adapter(&self, request: &AdapterRequest) -> VmfleetResult<()>;

    /// Apply static IP settings through guest customization.
    async fn customize_network(&self, request: &NetworkRequest) -> VmfleetResult<()>;

    async fn power_on(&self, request: &PowerRequest) -> VmfleetResult<()>;
}
