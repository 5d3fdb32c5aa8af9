//! Typed requests for control-plane operations.
//!
//! Each request carries exactly the descriptor fields its operation needs.
//! Endpoint-wide values (template, network, datastore) belong to the
//! provider's connection, not to the request.

use crate::config::ServerDescriptor;
use vmfleet_shared::errors::VmfleetResult;

/// Device name of the primary network adapter on a cloned VM.
pub const PRIMARY_ADAPTER: &str = "ethernet-0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    pub vm: String,
    pub cpus: u32,
    pub memory_mb: u64,
}

impl From<&ServerDescriptor> for CloneRequest {
    fn from(server: &ServerDescriptor) -> Self {
        Self {
            vm: server.name.clone(),
            cpus: server.cpu,
            memory_mb: server.memory_mb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskRequest {
    pub vm: String,
    /// Datastore path of the new disk, derived from the VM name.
    pub disk_name: String,
    pub size_gb: u64,
    pub thick: bool,
}

impl DiskRequest {
    /// Build the application-disk request for a server.
    ///
    /// Fails with `InvalidConfiguration` when the descriptor's disk size is
    /// not positive, so no provider ever sees an invalid disk.
    pub fn for_server(server: &ServerDescriptor) -> VmfleetResult<Self> {
        let size_gb = server.app_disk_size_gb()?;
        Ok(Self {
            vm: server.name.clone(),
            disk_name: format!("{0}/{0}_001", server.name),
            size_gb,
            thick: true,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterRequest {
    pub vm: String,
    pub device: String,
}

impl From<&ServerDescriptor> for AdapterRequest {
    fn from(server: &ServerDescriptor) -> Self {
        Self {
            vm: server.name.clone(),
            device: PRIMARY_ADAPTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub vm: String,
    pub ip_address: String,
    pub netmask: String,
    pub gateway: String,
}

impl From<&ServerDescriptor> for NetworkRequest {
    fn from(server: &ServerDescriptor) -> Self {
        Self {
            vm: server.name.clone(),
            ip_address: server.ip_address.clone(),
            netmask: server.netmask.clone(),
            gateway: server.gateway.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerRequest {
    pub vm: String,
}

impl From<&ServerDescriptor> for PowerRequest {
    fn from(server: &ServerDescriptor) -> Self {
        Self {
            vm: server.name.clone(),
        }
    }
}
