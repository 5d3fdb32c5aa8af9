//! Desired state of a single server.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use vmfleet_shared::errors::{VmfleetError, VmfleetResult};

/// Desired state of one virtual machine.
///
/// Immutable once loaded: the batch coordinator owns descriptors for the
/// whole run and provisioning tasks only ever read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// VM name, unique within a run.
    pub name: String,
    /// vCPU count.
    pub cpu: u32,
    #[serde(rename = "memoryMB")]
    pub memory_mb: u64,
    /// Application disk size in GiB.
    ///
    /// Kept signed and defaulted so a missing or non-positive value survives
    /// loading and is rejected by the disk step for this server only.
    #[serde(rename = "appDisk", default)]
    pub app_disk_gb: i64,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
    pub netmask: String,
    pub gateway: String,
}

impl ServerDescriptor {
    /// Application disk size, or `InvalidConfiguration` if it is not positive.
    pub fn app_disk_size_gb(&self) -> VmfleetResult<u64> {
        match u64::try_from(self.app_disk_gb) {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(VmfleetError::InvalidConfiguration(format!(
                "server {}: appDisk must be a positive size in GB, got {}",
                self.name, self.app_disk_gb
            ))),
        }
    }

    /// Load-time checks. The disk size is deliberately not checked here.
    pub fn validate(&self) -> VmfleetResult<()> {
        if self.name.trim().is_empty() {
            return Err(VmfleetError::InvalidConfiguration(
                "server name must not be empty".into(),
            ));
        }
        if self.cpu == 0 {
            return Err(self.invalid("cpu must be at least 1"));
        }
        if self.memory_mb == 0 {
            return Err(self.invalid("memoryMB must be at least 1"));
        }

        for (field, value) in [
            ("ipaddress", &self.ip_address),
            ("netmask", &self.netmask),
            ("gateway", &self.gateway),
        ] {
            value.parse::<Ipv4Addr>().map_err(|_| {
                self.invalid(&format!("{} is not an IPv4 address: '{}'", field, value))
            })?;
        }

        Ok(())
    }

    fn invalid(&self, msg: &str) -> VmfleetError {
        VmfleetError::InvalidConfiguration(format!("server {}: {}", self.name, msg))
    }
}

#[cfg(test)]
pub(crate) fn test_descriptor(name: &str, app_disk_gb: i64) -> ServerDescriptor {
    ServerDescriptor {
        name: name.to_string(),
        cpu: 2,
        memory_mb: 4096,
        app_disk_gb,
        ip_address: "10.0.0.10".to_string(),
        netmask: "255.255.255.0".to_string(),
        gateway: "10.0.0.1".to_string(),
    }
}
